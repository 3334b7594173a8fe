//! Rendering of the pinned status message.

/// Lifecycle of the admin-visible status message for one broadcast job.
///
/// The variants map one-to-one onto the three texts the job writes into
/// the admin chat: the initial banner, the periodic progress edit, and
/// the final summary edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastStatus {
    /// Job accepted, no deliveries attempted yet.
    Starting { total: usize },
    /// Fan-out in flight.
    Sending { percent: u8, sent: u32, failed: u32 },
    /// Fan-out over, either all recipients processed or the job cancelled.
    Finished { sent: u32, failed: u32 },
}

impl BroadcastStatus {
    /// Returns the message text shown in the admin chat.
    pub fn to_message(&self) -> String {
        match self {
            BroadcastStatus::Starting { total } => {
                format!("🚀 Starting broadcast for {total} recipients... 0%")
            }
            BroadcastStatus::Sending { percent, sent, failed } => {
                format!("📤 Sending... {percent}% | sent: {sent} | failed: {failed}")
            }
            BroadcastStatus::Finished { sent, failed } => {
                format!("✅ Broadcast finished | sent: {sent} | failed: {failed}")
            }
        }
    }
}
