use livecast_core::{SpeechPriority, SpeechQueue, SpeechRequest};

fn request(text: &str, priority: SpeechPriority) -> SpeechRequest {
    SpeechRequest::new(text, priority, "test").expect("valid request")
}

#[tokio::test]
async fn dequeue_order_is_non_increasing_by_priority() {
    let queue = SpeechQueue::new();
    queue.add(request("low one", SpeechPriority::Low)).await;
    queue.add(request("normal one", SpeechPriority::Normal)).await;
    queue.add(request("urgent one", SpeechPriority::Urgent)).await;
    queue.add(request("high one", SpeechPriority::High)).await;
    queue.add(request("normal two", SpeechPriority::Normal)).await;

    let mut last_rank = u8::MAX;
    while let Some(next) = queue.take_next().await {
        assert!(
            next.priority.rank() <= last_rank,
            "priority went up: {} after rank {last_rank}",
            next.priority.as_str()
        );
        last_rank = next.priority.rank();
    }
}

#[tokio::test]
async fn equal_priority_is_fifo() {
    let queue = SpeechQueue::new();
    queue.add(request("first", SpeechPriority::Normal)).await;
    queue.add(request("second", SpeechPriority::Normal)).await;
    queue.add(request("third", SpeechPriority::Normal)).await;

    assert_eq!(queue.take_next().await.unwrap().text, "first");
    assert_eq!(queue.take_next().await.unwrap().text, "second");
    assert_eq!(queue.take_next().await.unwrap().text, "third");
}

#[tokio::test]
async fn high_priority_jumps_ahead_of_queued_normals() {
    let queue = SpeechQueue::new();
    queue.add(request("pitch part 1", SpeechPriority::Normal)).await;
    queue.add(request("pitch part 2", SpeechPriority::Normal)).await;
    queue.add(request("chat answer", SpeechPriority::High)).await;

    assert_eq!(queue.take_next().await.unwrap().text, "chat answer");
    assert_eq!(queue.take_next().await.unwrap().text, "pitch part 1");
}

#[tokio::test]
async fn clear_keeping_high_priority_retains_high_and_urgent() {
    let queue = SpeechQueue::new();
    queue.add(request("low", SpeechPriority::Low)).await;
    queue.add(request("normal", SpeechPriority::Normal)).await;
    queue.add(request("high", SpeechPriority::High)).await;
    queue.add(request("urgent", SpeechPriority::Urgent)).await;

    queue.clear(true).await;
    assert_eq!(queue.len().await, 2);
    assert_eq!(queue.take_next().await.unwrap().priority, SpeechPriority::Urgent);
    assert_eq!(queue.take_next().await.unwrap().priority, SpeechPriority::High);
}

#[tokio::test]
async fn clear_without_keep_empties_everything() {
    let queue = SpeechQueue::new();
    queue.add(request("a", SpeechPriority::Urgent)).await;
    queue.add(request("b", SpeechPriority::Normal)).await;

    queue.clear(false).await;
    assert!(queue.is_empty().await);
    assert!(queue.take_next().await.is_none());
}

#[tokio::test]
async fn paused_queue_yields_nothing_until_resumed() {
    let queue = SpeechQueue::new();
    queue.add(request("waiting", SpeechPriority::Normal)).await;

    queue.pause().await;
    assert!(queue.take_next().await.is_none());
    assert_eq!(queue.len().await, 1, "pause must not drop entries");

    queue.resume().await;
    assert_eq!(queue.take_next().await.unwrap().text, "waiting");
}

#[tokio::test]
async fn interrupt_is_delivered_to_the_playing_speech() {
    let queue = SpeechQueue::new();
    let pitch = request("long running pitch", SpeechPriority::Normal);
    queue.add(pitch.clone()).await;

    let playing = queue.take_next().await.unwrap();
    let epoch = queue.begin(&playing).await;

    let urgent = request("ด่วน!", SpeechPriority::Urgent).interruptible(true);
    queue.add(urgent).await;

    tokio::time::timeout(std::time::Duration::from_millis(200), queue.interrupted(epoch))
        .await
        .expect("interrupt should reach the on-air speech");
    queue.finish().await;
}

#[tokio::test]
async fn stale_interrupt_permit_does_not_abort_the_next_speech() {
    // An urgent request can land after the playing speech's wait has
    // ended but before the consumer calls finish. The permit it
    // leaves behind targets the old playback and must not cut short
    // the urgent speech itself.
    let queue = SpeechQueue::new();
    let pitch = request("long running pitch", SpeechPriority::Normal);
    queue.add(pitch.clone()).await;
    let playing = queue.take_next().await.unwrap();
    queue.begin(&playing).await;

    // The consumer's wait is already over; nobody is listening for
    // the interrupt when it arrives.
    let urgent = request("ด่วน! ลดราคา 5 นาที", SpeechPriority::Urgent).interruptible(true);
    queue.add(urgent).await;
    queue.finish().await;

    // The urgent request plays next and must hold its full duration.
    let next = queue.take_next().await.unwrap();
    assert_eq!(next.priority, SpeechPriority::Urgent);
    let epoch = queue.begin(&next).await;

    tokio::select! {
        _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
        _ = queue.interrupted(epoch) => {
            panic!("urgent speech aborted on an interrupt meant for its predecessor");
        }
    }
    queue.finish().await;
}

#[tokio::test]
async fn empty_text_is_rejected_without_side_effects() {
    assert!(SpeechRequest::new("", SpeechPriority::Normal, "test").is_err());
    assert!(SpeechRequest::new("   \n\t ", SpeechPriority::Normal, "test").is_err());
}

#[tokio::test]
async fn non_positive_duration_is_rejected() {
    let req = request("fine", SpeechPriority::Normal);
    assert!(req.clone().with_duration(0.0).is_err());
    assert!(req.with_duration(-1.5).is_err());
}

#[test]
fn duration_estimate_follows_character_count() {
    // 100 chars -> 100 * 0.05 + 1.0 = 6.0 seconds
    let text = "a".repeat(100);
    assert!((SpeechRequest::estimate_duration(&text) - 6.0).abs() < f64::EPSILON);
    // Short texts never go under the two second floor.
    assert_eq!(SpeechRequest::estimate_duration("hi"), 2.0);
    // Thai counts characters, not bytes.
    let thai = "ก".repeat(100);
    assert!((SpeechRequest::estimate_duration(&thai) - 6.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn status_previews_truncate_and_cap_at_ten() {
    let queue = SpeechQueue::new();
    let long_text = "ข".repeat(80);
    for _ in 0..12 {
        queue.add(request(&long_text, SpeechPriority::Normal)).await;
    }

    let status = queue.status().await;
    assert_eq!(status.queue_length, 12);
    assert_eq!(status.queued.len(), 10);
    let preview = &status.queued[0];
    assert!(preview.text.ends_with("..."));
    assert_eq!(preview.text.chars().count(), 33);
}
