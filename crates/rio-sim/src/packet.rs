//! Simulated packets and the two classification methods.

use std::collections::HashSet;

use rio_aqm::{Classifier, Packet, PriorityMethod, TrafficClass};

// ─── Packet ─────────────────────────────────────────────────────────────────

/// A replayed packet. The class tag and flow id are fixed at creation, so
/// classification is stable between enqueue and dequeue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPacket {
    pub uid: u64,
    pub size: u32,
    pub flow: u16,
    pub class: TrafficClass,
    pub ecn_capable: bool,
    pub marked: bool,
}

impl SimPacket {
    pub fn new(uid: u64, size: u32, flow: u16, class: TrafficClass) -> Self {
        SimPacket {
            uid,
            size,
            flow,
            class,
            ecn_capable: false,
            marked: false,
        }
    }

    pub fn ecn_capable(mut self) -> Self {
        self.ecn_capable = true;
        self
    }
}

impl Packet for SimPacket {
    fn size(&self) -> u32 {
        self.size
    }

    fn mark(&mut self) -> bool {
        if self.ecn_capable {
            self.marked = true;
        }
        self.ecn_capable
    }
}

// ─── Classifiers ────────────────────────────────────────────────────────────

/// Trusts the explicit class tag carried by the packet.
#[derive(Debug, Clone, Default)]
pub struct HeaderClassifier;

impl Classifier<SimPacket> for HeaderClassifier {
    fn class_of(&self, item: &SimPacket) -> TrafficClass {
        item.class
    }
}

/// Classifies by flow identity: flows in the configured set are In-profile,
/// everything else is Out.
#[derive(Debug, Clone)]
pub struct FlowClassifier {
    in_flows: HashSet<u16>,
}

impl FlowClassifier {
    pub fn new(in_flows: impl IntoIterator<Item = u16>) -> Self {
        FlowClassifier {
            in_flows: in_flows.into_iter().collect(),
        }
    }
}

impl Classifier<SimPacket> for FlowClassifier {
    fn class_of(&self, item: &SimPacket) -> TrafficClass {
        if self.in_flows.contains(&item.flow) {
            TrafficClass::In
        } else {
            TrafficClass::Out
        }
    }
}

/// Classifier selected by the engine configuration's priority method.
#[derive(Debug, Clone)]
pub enum SimClassifier {
    Header(HeaderClassifier),
    Flow(FlowClassifier),
}

impl SimClassifier {
    /// Pick the classifier matching `method`. Flow-identity mode treats flow
    /// 0 as the In-profile aggregate, mirroring how the harness assigns
    /// flows.
    pub fn for_method(method: PriorityMethod) -> Self {
        match method {
            PriorityMethod::HeaderField => SimClassifier::Header(HeaderClassifier),
            PriorityMethod::FlowIdentity => SimClassifier::Flow(FlowClassifier::new([0])),
        }
    }
}

impl Classifier<SimPacket> for SimClassifier {
    fn class_of(&self, item: &SimPacket) -> TrafficClass {
        match self {
            SimClassifier::Header(c) => c.class_of(item),
            SimClassifier::Flow(c) => c.class_of(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_classifier_reads_the_tag() {
        let c = HeaderClassifier;
        let p = SimPacket::new(0, 500, 7, TrafficClass::In);
        assert_eq!(c.class_of(&p), TrafficClass::In);
    }

    #[test]
    fn flow_classifier_uses_membership() {
        let c = FlowClassifier::new([0, 2]);
        let inp = SimPacket::new(0, 500, 2, TrafficClass::Out);
        let out = SimPacket::new(1, 500, 3, TrafficClass::Out);
        // The flow id decides, not the tag.
        assert_eq!(c.class_of(&inp), TrafficClass::In);
        assert_eq!(c.class_of(&out), TrafficClass::Out);
    }

    #[test]
    fn mark_respects_ecn_capability() {
        let mut plain = SimPacket::new(0, 500, 0, TrafficClass::Out);
        assert!(!plain.mark());
        assert!(!plain.marked);

        let mut capable = SimPacket::new(1, 500, 0, TrafficClass::Out).ecn_capable();
        assert!(capable.mark());
        assert!(capable.marked);
    }
}
