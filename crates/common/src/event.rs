use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::AggregateId;

/// Uniform accessor every domain event exposes.
///
/// Events are immutable facts. The owning identifier is read through this
/// trait instead of being looked up by field name, and the kind is a closed,
/// copyable tag used to route publications to subscribers.
pub trait DomainEvent: Debug + Clone + Send + Sync + 'static {
    /// Closed set of event kinds, one per variant.
    type Kind: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Returns the kind tag of this event.
    fn kind(&self) -> Self::Kind;

    /// Returns the identifier of the aggregate that owns this event.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns the kind name used in logs and error messages.
    fn event_type(&self) -> String {
        self.kind().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        Ping,
    }

    impl Display for PingKind {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("Ping")
        }
    }

    #[derive(Debug, Clone)]
    struct Ping {
        id: AggregateId,
    }

    impl DomainEvent for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            PingKind::Ping
        }

        fn aggregate_id(&self) -> AggregateId {
            self.id
        }
    }

    #[test]
    fn event_type_defaults_to_kind_display() {
        let ping = Ping {
            id: AggregateId::new(),
        };
        assert_eq!(ping.event_type(), "Ping");
        assert_eq!(ping.kind(), PingKind::Ping);
    }
}
