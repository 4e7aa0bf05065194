mod support;

use std::sync::atomic::Ordering;
use std::time::Duration;

use recurrist::entities::{AttachmentFolder, FieldEdit};
use recurrist::events::EngineEvent;
use support::{drain_events, engine, persisted_task, RecordedCall};

#[tokio::test(start_paused = true)]
async fn test_upload_appends_to_local_list_with_server_id() {
    let (engine, _events, _gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    let attachment = engine
        .on_attachment_upload(&id, "notes.pdf", "application/pdf", b"pdf", AttachmentFolder::Attachments)
        .await
        .unwrap();

    assert!(attachment.id.is_some());
    let task = engine.get_task(&id).unwrap();
    assert_eq!(task.attachments.len(), 1);
    assert_eq!(task.attachments[0].name, "notes.pdf");
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_leaves_local_state_untouched() {
    let (engine, mut events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;
    engine
        .on_field_edit(&id, FieldEdit::Description("<p>draft text</p>".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    drain_events(&mut events);

    gateway.fail_upload.store(true, Ordering::SeqCst);
    let result = engine
        .on_attachment_upload(&id, "photo.png", "image/png", b"png", AttachmentFolder::Description)
        .await;
    assert!(result.is_err());

    let task = engine.get_task(&id).unwrap();
    assert!(task.attachments.is_empty(), "no placeholder may appear");
    assert_eq!(task.description, "<p>draft text</p>");
    let surfaced = drain_events(&mut events).into_iter().any(
        |e| matches!(e, EngineEvent::OperationFailed { operation, .. } if operation == "attachment upload"),
    );
    assert!(surfaced);
}

#[tokio::test(start_paused = true)]
async fn test_failed_registration_leaves_local_list_unchanged() {
    let (engine, _events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    gateway.fail_register.store(true, Ordering::SeqCst);
    let result = engine
        .on_attachment_upload(&id, "photo.png", "image/png", b"png", AttachmentFolder::Attachments)
        .await;

    assert!(result.is_err());
    assert!(engine.get_task(&id).unwrap().attachments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_strips_local_list_only_after_remote_confirms() {
    let (engine, _events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    let attachment = engine
        .on_attachment_upload(&id, "notes.pdf", "application/pdf", b"pdf", AttachmentFolder::Attachments)
        .await
        .unwrap();
    let attachment_id = attachment.id.unwrap();

    gateway.fail_remove_attachment.store(true, Ordering::SeqCst);
    assert!(engine.on_attachment_delete(&id, &attachment_id).await.is_err());
    assert_eq!(
        engine.get_task(&id).unwrap().attachments.len(),
        1,
        "the list only changes after the remote store confirms"
    );

    gateway.fail_remove_attachment.store(false, Ordering::SeqCst);
    engine.on_attachment_delete(&id, &attachment_id).await.unwrap();
    assert!(engine.get_task(&id).unwrap().attachments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deleted_attachment_never_resurrects_through_description_edit() {
    let (engine, _events, _gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    let attachment = engine
        .on_attachment_upload(&id, "diagram.png", "image/png", b"png", AttachmentFolder::Description)
        .await
        .unwrap();
    let url = attachment.url.clone();
    engine
        .on_field_edit(&id, FieldEdit::Description(format!("<p>see <img src=\"{}\"></p>", url)))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    engine
        .on_attachment_delete(&id, attachment.id.as_deref().unwrap())
        .await
        .unwrap();
    // Immediately edit the description again.
    engine
        .on_field_edit(&id, FieldEdit::Description("<p>rewritten</p>".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let task = engine.get_task(&id).unwrap();
    assert!(task.attachments.is_empty(), "the deleted attachment must not reappear");
    assert!(!task.description.contains(&url));
}

#[tokio::test(start_paused = true)]
async fn test_inline_delete_strips_media_reference_and_recommits_description() {
    let (engine, _events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    let attachment = engine
        .on_attachment_upload(&id, "chart.png", "image/png", b"png", AttachmentFolder::Description)
        .await
        .unwrap();
    let url = attachment.url.clone();
    engine
        .on_field_edit(
            &id,
            FieldEdit::Description(format!("<p>intro</p><img src=\"{}\"><p>outro</p>", url)),
        )
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    gateway.clear_calls();

    engine
        .on_attachment_delete(&id, attachment.id.as_deref().unwrap())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let task = engine.get_task(&id).unwrap();
    assert_eq!(task.description, "<p>intro</p><p>outro</p>");
    // The stripped description went out as a fresh commit.
    let described = gateway
        .patch_calls()
        .into_iter()
        .filter_map(|p| p.description)
        .any(|d| d == "<p>intro</p><p>outro</p>");
    assert!(described);
}

#[tokio::test(start_paused = true)]
async fn test_orphaned_inline_media_is_swept_on_description_edit() {
    let (engine, _events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    let kept = engine
        .on_attachment_upload(&id, "kept.png", "image/png", b"png", AttachmentFolder::Description)
        .await
        .unwrap();
    let dropped = engine
        .on_attachment_upload(&id, "dropped.png", "image/png", b"png", AttachmentFolder::Description)
        .await
        .unwrap();

    engine
        .on_field_edit(
            &id,
            FieldEdit::Description(format!(
                "<img src=\"{}\"><img src=\"{}\">",
                kept.url, dropped.url
            )),
        )
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    // The new content only references one of the two.
    engine
        .on_field_edit(&id, FieldEdit::Description(format!("<img src=\"{}\">", kept.url)))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let task = engine.get_task(&id).unwrap();
    assert_eq!(task.attachments.len(), 1);
    assert_eq!(task.attachments[0].url, kept.url);
    let removed = gateway.calls().into_iter().any(|c| {
        matches!(c, RecordedCall::RemoveAttachment { attachment_id, .. }
            if Some(attachment_id.as_str()) == dropped.id.as_deref())
    });
    assert!(removed, "the orphan goes through the regular delete flow");
}

#[tokio::test(start_paused = true)]
async fn test_explicit_file_attachments_survive_description_edits() {
    let (engine, _events, gateway) = engine();
    let id = persisted_task(&engine, "Report").await;

    engine
        .on_attachment_upload(&id, "contract.pdf", "application/pdf", b"pdf", AttachmentFolder::Attachments)
        .await
        .unwrap();
    gateway.clear_calls();

    engine
        .on_field_edit(&id, FieldEdit::Description("<p>nothing embedded</p>".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        engine.get_task(&id).unwrap().attachments.len(),
        1,
        "file attachments are never auto-deleted by content diffing"
    );
}

#[tokio::test(start_paused = true)]
async fn test_upload_requires_a_persisted_task() {
    let (engine, _events, gateway) = engine();
    let id = engine.create_task(support::seed("Draft"));

    let result = engine
        .on_attachment_upload(&id, "early.png", "image/png", b"png", AttachmentFolder::Attachments)
        .await;

    assert!(result.is_err());
    assert_eq!(gateway.total_calls(), 0);
}
