//! Best-effort chat transport with an offline outbox.

use chrono::Utc;
use tier5_schema::{ChatExchange, ChatReply, ChatRequest, ConsoleEvent, ToastLevel};
use tier5_store::QueuedChat;

use crate::Console;

impl Console {
    /// Sends a chat prompt. An offline failure parks it in the outbox and
    /// returns `None`.
    pub async fn send_chat(
        &mut self,
        message: &str,
        conversation_entry_id: Option<String>,
    ) -> Option<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        let request = ChatRequest {
            message: message.to_string(),
            conversation_entry_id: conversation_entry_id.clone(),
        };
        match self.api.chat(&request).await {
            Ok(reply) => {
                self.record_exchange(message, &reply).await;
                Some(reply)
            }
            Err(e) if e.is_offline() => {
                let mut queue = self.store.chat_offline_queue();
                queue.push(QueuedChat::new(message, conversation_entry_id));
                self.store.set_chat_offline_queue(&queue).await;
                tracing::info!(queued = queue.len(), "chat prompt queued offline");
                self.toast(ToastLevel::Warning, "Offline: prompt queued").await;
                self.publish(ConsoleEvent::ChatQueuedOffline { queued: queue.len() })
                    .await;
                None
            }
            Err(e) => {
                self.report(e, "Chat request failed").await;
                None
            }
        }
    }

    /// Resends queued prompts in order and stops at the first offline
    /// failure. Prompts rejected for other reasons are dropped. Returns the
    /// number delivered.
    pub async fn flush_outbox(&mut self) -> usize {
        let mut queue = self.store.chat_offline_queue();
        let mut delivered = 0;

        while let Some(next) = queue.first().cloned() {
            let request = ChatRequest {
                message: next.message.clone(),
                conversation_entry_id: next.conversation_entry_id.clone(),
            };
            match self.api.chat(&request).await {
                Ok(reply) => {
                    queue.remove(0);
                    delivered += 1;
                    self.record_exchange(&next.message, &reply).await;
                }
                Err(e) if e.is_offline() => {
                    tracing::debug!(remaining = queue.len(), "still offline; outbox kept");
                    break;
                }
                Err(e) => {
                    queue.remove(0);
                    self.report(e, "Dropped queued chat prompt").await;
                }
            }
            self.store.set_chat_offline_queue(&queue).await;
        }

        if delivered > 0 {
            self.toast(ToastLevel::Success, format!("Sent {delivered} queued prompt(s)"))
                .await;
        }
        delivered
    }

    pub fn outbox_len(&self) -> usize {
        self.store.chat_offline_queue().len()
    }

    async fn record_exchange(&mut self, prompt: &str, reply: &ChatReply) {
        self.store
            .push_chat_exchange(ChatExchange {
                prompt: prompt.to_string(),
                reply: reply.reply.clone(),
                at: Utc::now(),
            })
            .await;
    }
}
