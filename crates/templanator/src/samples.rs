//! Built-in source/template pairs used by the `example` commands.

use crate::display::DisplayVariant;
use crate::engine::EngineKind;

pub const IP_INTERFACE_BRIEF: &str = "\
Interface                  IP-Address      OK? Method Status                Protocol
FastEthernet0/0            192.168.1.1     YES NVRAM  up                    up
FastEthernet0/1            unassigned      YES NVRAM  administratively down down
FastEthernet0/2            192.168.2.1     YES NVRAM  up                    up
";

pub const TEXTFSM_IP_INTERFACE_BRIEF: &str = r"Value Interface (\S+)
Value IP_Address (\S+)
Value OK (\S+)
Value Method (\S+)
Value Status (.+?)
Value Protocol (\S+)

Start
  ^Interface\s+IP-Address
  ^${Interface}\s+${IP_Address}\s+${OK}\s+${Method}\s+${Status}\s+${Protocol}\s*$$ -> Record
";

pub const TTP_IP_INTERFACE_BRIEF: &str = r#"
<group name="interfaces">
{{ interface }} {{ ip }} {{ ok | re("YES|NO") }} {{ method }} {{ status | ORPHRASE }} {{ protocol }}
</group>
"#;

pub const CDP_NEIGHBORS: &str = "\
Capability Codes: R - Router, T - Trans Bridge, B - Source Route Bridge
                  S - Switch, H - Host, I - IGMP, r - Repeater, P - Phone

Device ID        Local Intrfce     Holdtme    Capability  Platform  Port ID
sw-core-01       Gig 0/1           155         S I        WS-C3850  Gig 1/0/1
rtr-edge-02      Gig 0/2           132         R S I      ISR4451   Gig 0/0/0
ap-floor3        Gig 0/3           120         T B I      AIR-AP28  Gig 0
";

pub const CDP_NEIGHBORS_DETAIL: &str = "\
-------------------------
Device ID: sw-core-01
Entry address(es):
  IP address: 10.0.0.2
Platform: cisco WS-C3850-48P,  Capabilities: Switch IGMP
Interface: GigabitEthernet0/1,  Port ID (outgoing port): GigabitEthernet1/0/1
Holdtime : 155 sec

Version :
Cisco IOS Software, Catalyst L3 Switch Software (CAT3K_CAA-UNIVERSALK9-M), Version 16.12.4, RELEASE SOFTWARE (fc5)

-------------------------
Device ID: rtr-edge-02
Entry address(es):
  IP address: 10.0.0.6
Platform: cisco ISR4451-X/K9,  Capabilities: Router Switch IGMP
Interface: GigabitEthernet0/2,  Port ID (outgoing port): GigabitEthernet0/0/0
Holdtime : 132 sec

Version :
Cisco IOS XE Software, Version 17.03.04a

";

pub const TEXTFSM_CDP_NEIGHBORS: &str = r"Value NEIGHBOR (\S+)
Value LOCAL_INTERFACE (\S+\s\S+)
Value HOLDTIME (\d+)
Value CAPABILITY ((?:[RTBSHIrPDCM]\s)*[RTBSHIrPDCM])
Value PLATFORM (\S+)
Value NEIGHBOR_INTERFACE (.+?)

Start
  ^Device\s+ID -> Neighbors

Neighbors
  ^${NEIGHBOR}\s+${LOCAL_INTERFACE}\s+${HOLDTIME}\s+${CAPABILITY}\s+${PLATFORM}\s+${NEIGHBOR_INTERFACE}\s*$$ -> Record
";

pub const TEXTFSM_CDP_NEIGHBORS_DETAIL: &str = r"Value NEIGHBOR (\S+)
Value MGMT_ADDRESS (\d+\.\d+\.\d+\.\d+)
Value PLATFORM (.+?)
Value CAPABILITIES (.+?)
Value LOCAL_INTERFACE (\S+)
Value NEIGHBOR_INTERFACE (\S+)
Value HOLDTIME (\d+)
Value SOFTWARE_VERSION (.+)

Start
  ^Device ID: ${NEIGHBOR}
  ^\s+IP address: ${MGMT_ADDRESS}
  ^Platform: ${PLATFORM},\s+Capabilities: ${CAPABILITIES}\s*$$
  ^Interface: ${LOCAL_INTERFACE},\s+Port ID \(outgoing port\): ${NEIGHBOR_INTERFACE}
  ^Holdtime\s*:\s*${HOLDTIME}
  ^Version\s*: -> Version

Version
  ^${SOFTWARE_VERSION} -> Record Start
";

pub const TTP_CDP_NEIGHBORS: &str = r#"
<group name="neighbors">
{{ neighbor }} {{ local_interface | ORPHRASE }} {{ holdtime | DIGIT | to_int }} {{ capability | ORPHRASE }} {{ platform }} {{ neighbor_interface | ORPHRASE }}
</group>
"#;

pub const TTP_CDP_NEIGHBORS_DETAIL: &str = r#"
<group name="neighbors">
Device ID: {{ neighbor }}
  IP address: {{ mgmt_address | IP }}
Platform: {{ platform | ORPHRASE }},  Capabilities: {{ capabilities | ORPHRASE }}
Interface: {{ local_interface }},  Port ID (outgoing port): {{ neighbor_interface }}
Holdtime : {{ holdtime | DIGIT | to_int }} sec
</group>
"#;

pub const JINJA_INTERFACES_CONTEXT: &str = "\
hostname: edge-rtr-01
interfaces:
  - name: GigabitEthernet0/0
    description: Uplink to core
    ip: 10.0.0.1
    mask: 255.255.255.252
  - name: GigabitEthernet0/1
    description: User LAN
    ip: 192.168.10.1
    mask: 255.255.255.0
";

pub const JINJA_INTERFACES_TEMPLATE: &str = "\
hostname {{ hostname }}
!
{% for intf in interfaces %}
interface {{ intf.name }}
 description {{ intf.description }}
 ip address {{ intf.ip }} {{ intf.mask }}
 no shutdown
!
{% endfor %}
";

/// CDP neighbor example for a parsing engine and display variant.
///
/// Returns `None` for engines without a CDP example (Jinja2).
pub fn cdp_example(kind: EngineKind, variant: DisplayVariant) -> Option<(&'static str, &'static str)> {
    match (kind, variant) {
        (EngineKind::TextFsm, DisplayVariant::Table) => Some((CDP_NEIGHBORS, TEXTFSM_CDP_NEIGHBORS)),
        (EngineKind::TextFsm, DisplayVariant::Detail) => Some((CDP_NEIGHBORS_DETAIL, TEXTFSM_CDP_NEIGHBORS_DETAIL)),
        (EngineKind::Ttp, DisplayVariant::Table) => Some((CDP_NEIGHBORS, TTP_CDP_NEIGHBORS)),
        (EngineKind::Ttp, DisplayVariant::Detail) => Some((CDP_NEIGHBORS_DETAIL, TTP_CDP_NEIGHBORS_DETAIL)),
        (EngineKind::Jinja2, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{TextFsmEngine, TtpEngine};
    use crate::engine::TemplateEngine;
    use serde_json::json;

    #[test]
    fn test_textfsm_cdp_table() {
        let output = TextFsmEngine::new()
            .process(CDP_NEIGHBORS, TEXTFSM_CDP_NEIGHBORS)
            .unwrap();
        let records = output.to_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["LOCAL_INTERFACE"], json!("Gig 0/1"));
        assert_eq!(records[1]["CAPABILITY"], json!("R S I"));
        assert_eq!(records[2]["NEIGHBOR_INTERFACE"], json!("Gig 0"));
    }

    #[test]
    fn test_textfsm_cdp_detail() {
        let output = TextFsmEngine::new()
            .process(CDP_NEIGHBORS_DETAIL, TEXTFSM_CDP_NEIGHBORS_DETAIL)
            .unwrap();
        let records = output.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["PLATFORM"], json!("cisco WS-C3850-48P"));
        assert_eq!(records[1]["CAPABILITIES"], json!("Router Switch IGMP"));
        assert_eq!(records[1]["SOFTWARE_VERSION"], json!("Cisco IOS XE Software, Version 17.03.04a"));
    }

    #[test]
    fn test_ttp_cdp_table() {
        let output = TtpEngine::new().process(CDP_NEIGHBORS, TTP_CDP_NEIGHBORS).unwrap();
        let records = output.to_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["holdtime"], json!(155));
        assert_eq!(records[2]["platform"], json!("AIR-AP28"));
    }

    #[test]
    fn test_ttp_cdp_detail() {
        let output = TtpEngine::new()
            .process(CDP_NEIGHBORS_DETAIL, TTP_CDP_NEIGHBORS_DETAIL)
            .unwrap();
        let records = output.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["mgmt_address"], json!("10.0.0.2"));
        assert_eq!(records[1]["neighbor_interface"], json!("GigabitEthernet0/0/0"));
    }
}
