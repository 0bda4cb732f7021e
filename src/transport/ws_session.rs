use super::hub::{SubscriberHub, Subscription};
use crate::game::errors::RoomError;
use crate::game::registry::RoomRegistry;
use crate::game::types::RoomId;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// Subscribes to a room that is still registered. The registry drops a room
/// before the hub closes it, so checking after subscribing cannot miss a close.
pub fn subscribe_live(
    hub: &SubscriberHub,
    registry: &RoomRegistry,
    room_id: &RoomId,
) -> Result<Subscription, RoomError> {
    let subscription = hub.subscribe(room_id);
    if let Err(error) = registry.get(room_id) {
        hub.unsubscribe(room_id, &subscription.session_id);
        return Err(error);
    }
    Ok(subscription)
}

/// Forwards room events to one subscriber until either side closes.
pub async fn handle_socket(
    socket: WebSocket,
    hub: Arc<SubscriberHub>,
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
) {
    let (mut sender, mut receiver) = socket.split();
    let subscription = match subscribe_live(&hub, &registry, &room_id) {
        Ok(subscription) => subscription,
        Err(error) => {
            tracing::debug!(%room_id, %error, "subscriber rejected");
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let session_id = subscription.session_id;
    let mut outbound_rx = subscription.receiver;
    tracing::debug!(%room_id, session_id = %session_id, "subscriber connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            _ = &mut send_task => break,
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unsubscribe(&room_id, &session_id);
    send_task.abort();
    tracing::debug!(%room_id, session_id = %session_id, "subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::EngineConfig;
    use crate::game::types::UserId;
    use std::time::Duration;

    fn registry_over(hub: &Arc<SubscriberHub>) -> Arc<RoomRegistry> {
        let config = EngineConfig {
            bot_interval: Duration::from_secs(3600),
            ..EngineConfig::default()
        };
        RoomRegistry::new(config, hub.clone())
    }

    #[tokio::test]
    async fn deleted_room_leaves_no_subscriber_behind() {
        let hub = Arc::new(SubscriberHub::new());
        let registry = registry_over(&hub);
        let room = registry
            .create("Lobby", UserId::new("host"), "Host")
            .expect("room");
        let room_id = room.id().clone();
        registry.delete(&room_id).await.expect("room exists");

        let result = subscribe_live(&hub, &registry, &room_id);
        assert!(matches!(result, Err(RoomError::RoomNotFound(_))));
        assert_eq!(hub.subscriber_count(&room_id), 0);
    }

    #[tokio::test]
    async fn live_subscription_ends_when_room_is_deleted() {
        let hub = Arc::new(SubscriberHub::new());
        let registry = registry_over(&hub);
        let room = registry
            .create("Lobby", UserId::new("host"), "Host")
            .expect("room");
        let room_id = room.id().clone();

        let mut subscription = subscribe_live(&hub, &registry, &room_id).expect("room is live");
        assert_eq!(hub.subscriber_count(&room_id), 1);
        registry.delete(&room_id).await.expect("room exists");

        let mut frames = Vec::new();
        while let Some(frame) = subscription.receiver.recv().await {
            frames.push(frame);
        }
        assert!(frames.last().expect("close frame").contains("roomClosed"));
        assert_eq!(hub.subscriber_count(&room_id), 0);
    }
}
