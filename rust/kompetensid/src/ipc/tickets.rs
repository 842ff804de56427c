use std::collections::HashMap;
use uuid::Uuid;

/// Latest request ticket per UI channel (a list view, a pagination bar).
///
/// A response whose ticket is no longer current belongs to a request the user
/// has already superseded and should not be applied.
#[derive(Debug, Default)]
pub struct TicketBook {
    latest: HashMap<String, Uuid>,
}

impl TicketBook {
    pub fn issue(&mut self, channel: &str) -> Uuid {
        let ticket = Uuid::new_v4();
        self.latest.insert(channel.to_string(), ticket);
        ticket
    }

    pub fn is_current(&self, channel: &str, ticket: &Uuid) -> bool {
        self.latest.get(channel) == Some(ticket)
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}
