//! ConsoleMessenger as the delivery end of a real pipeline run.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tunebot::console::ConsoleMessenger;
use tunecore::download::MediaMetadata;
use tunecore::{ConversationId, Messenger};

#[tokio::test]
async fn test_send_audio_copies_into_output_dir() {
    let scratch = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = scratch.path().join("track-ABCDEF123456");
    std::fs::write(&source, vec![42u8; 2048]).unwrap();

    let messenger = Arc::new(ConsoleMessenger::new(output.path(), "song.mp3"));
    let metadata = MediaMetadata {
        title: Some("Static".into()),
        performer: Some("The Relays".into()),
        duration_secs: 3,
    };
    messenger
        .send_audio(ConversationId(0), &source, &metadata)
        .await
        .unwrap();

    let delivered = messenger.delivered().unwrap();
    assert_eq!(delivered, output.path().join("The Relays - Static"));
    assert_eq!(std::fs::read(&delivered).unwrap().len(), 2048);
    // The scratch copy is left for the pipeline to remove
    assert!(source.exists());
}

#[tokio::test]
async fn test_uploads_are_rejected() {
    let output = tempfile::tempdir().unwrap();
    let messenger = ConsoleMessenger::new(output.path(), "track");
    assert!(messenger.file_download_url("BQAC").await.is_err());
}
