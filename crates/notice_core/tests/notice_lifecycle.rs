use notice_core::{
    create_notice, get_notice, AdminHost, DismissRequest, ManagerError, MemoryOptionStore,
    NewNotice, NoticeConfig, NoticeManager, OptionStore, StandaloneHost,
};
use serde_json::json;
use std::collections::BTreeMap;

fn manager() -> NoticeManager<MemoryOptionStore> {
    NoticeManager::from_store(MemoryOptionStore::new(), NoticeConfig::default()).unwrap()
}

fn admin(user_id: u64) -> StandaloneHost {
    StandaloneHost::new(user_id)
        .with_capability("manage_options")
        .with_screen("dashboard")
}

fn stored(manager: &mut NoticeManager<MemoryOptionStore>, args: serde_json::Value) {
    let args: NewNotice = serde_json::from_value(args).unwrap();
    create_notice(args).save(manager.repo_mut(), false).unwrap();
}

#[test]
fn one_shot_notice_renders_once() {
    let mut manager = manager();
    stored(&mut manager, json!({ "id": "x", "message": "Saved." }));

    let first = manager.display_notices(&admin(1)).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, "x");
    assert!(first[0].html.contains("<p>Saved.</p>"));
    assert!(!manager.repo().has("x"));

    let second = manager.display_notices(&admin(1)).unwrap();
    assert!(second.is_empty());
}

#[test]
fn persistent_notice_survives_display_and_flush() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "p", "message": "Stay", "persistent": true }),
    );

    manager.display_notices(&admin(1)).unwrap();
    assert!(manager.shutdown().unwrap());

    let repo = manager.into_repo();
    let record = repo.store().load_option(repo.option_name()).unwrap().unwrap();
    assert_eq!(record["p"]["message"], "Stay");
    assert_eq!(record["p"]["persistent"], true);
}

#[test]
fn individual_dismissal_is_per_user() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "y", "message": "Hi", "persistent": true, "individual": true }),
    );

    let host = admin(5).for_ajax();
    let request = DismissRequest {
        id: "y".to_string(),
        nonce: host.create_nonce(&manager.config().dismiss_action),
    };
    assert!(manager.dismiss_notice(&host, &request).unwrap());

    let notice = get_notice(manager.repo(), "y", false).unwrap();
    assert!(notice.is_dismissed(5));
    assert!(!notice.is_dismissed(6));

    assert!(manager.display_notices(&admin(5)).unwrap().is_empty());
    assert_eq!(manager.display_notices(&admin(6)).unwrap().len(), 1);
}

#[test]
fn shared_dismissal_deletes_notice() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "shared", "message": "Hi", "persistent": true }),
    );
    stored(
        &mut manager,
        json!({ "id": "other", "message": "Bye", "persistent": true }),
    );

    let host = admin(2).for_ajax();
    let form = BTreeMap::from([
        ("id".to_string(), "shared".to_string()),
        (
            "_wpnonce".to_string(),
            host.create_nonce("xwp_anm_dismiss_notice"),
        ),
    ]);
    let request = DismissRequest::from_form(&form, manager.config());

    assert!(manager.dismiss_notice(&host, &request).unwrap());
    assert!(!manager.repo().has("shared"));
    assert_eq!(manager.repo().store().writes(), 1);

    let repo = manager.into_repo();
    let record = repo.store().load_option(repo.option_name()).unwrap().unwrap();
    assert!(record.get("shared").is_none());
    assert_eq!(record["other"]["message"], "Bye");
}

#[test]
fn dismissal_with_bad_nonce_changes_nothing() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "y", "message": "Hi", "persistent": true }),
    );

    let request = DismissRequest {
        id: "y".to_string(),
        nonce: "forged".to_string(),
    };
    let err = manager
        .dismiss_notice(&admin(5).for_ajax(), &request)
        .unwrap_err();

    assert!(matches!(err, ManagerError::InvalidNonce));
    assert!(manager.repo().has("y"));
    assert_eq!(manager.repo().store().writes(), 0);
}

#[test]
fn screen_and_capability_gate_display() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "plugins-only", "message": "Hi", "screens": "plugins" }),
    );
    stored(
        &mut manager,
        json!({ "id": "editors", "message": "Hi", "cap": "edit_posts" }),
    );

    let rendered = manager.display_notices(&admin(1)).unwrap();
    assert!(rendered.is_empty());

    let editor = StandaloneHost::new(3)
        .with_capability("edit_posts")
        .with_screen("plugins");
    let ids: Vec<String> = manager
        .display_notices(&editor)
        .unwrap()
        .into_iter()
        .map(|rendered| rendered.id)
        .collect();
    assert_eq!(ids, ["editors"]);
}

#[test]
fn dismissible_persistent_notice_requests_footer_script() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "p", "message": "Stay", "persistent": true, "color": "#336699", "classes": "alt" }),
    );
    assert!(manager.footer_script().is_none());

    let rendered = manager.display_notices(&admin(1)).unwrap();
    let html = &rendered[0].html;
    assert!(html.contains("is-persistent"));
    assert!(html.contains("notice-alt"));
    assert!(html.contains("border-left-color: #336699 !important;"));
    assert!(html.contains("data-nonce="));

    let script = manager.footer_script().unwrap();
    assert!(script.contains("action: 'xwp_anm_dismiss_notice'"));
    assert!(!manager.can_show(&admin(1)));
}

#[test]
fn show_stores_a_one_shot_copy() {
    let mut manager = manager();
    stored(
        &mut manager,
        json!({ "id": "base", "message": "Again", "persistent": true, "individual": true }),
    );

    let mut copy = get_notice(manager.repo(), "base", false).unwrap();
    copy.show(manager.repo_mut()).unwrap();

    assert_ne!(copy.id(), "base");
    assert!(copy.id().starts_with("base-"));
    assert!(!copy.persistent());
    assert!(!copy.individual());
    assert_eq!(copy.attributes().get("data-id").map(String::as_str), Some("base"));
    assert_eq!(manager.repo().len(), 2);

    let rendered = manager.display_notices(&admin(1)).unwrap();
    assert_eq!(rendered.len(), 2);
    assert!(manager.repo().has("base"));
    assert!(!manager.repo().has(copy.id()));
}
