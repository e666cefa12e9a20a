use jarvis_match::config::{BonusRule, DeviceConfig};
use jarvis_match::device::{Capability, Device, DeviceMatchError, DeviceResolver};

fn devices() -> Vec<Device> {
    vec![
        Device::new(0, "Microfone (Logitech PRO X)", Capability::Input),
        Device::new(1, "Alto-falantes (Realtek(R) Audio)", Capability::Output),
        Device::new(2, "Fone de ouvido (Logitech PRO X)", Capability::Output),
        Device::new(3, "Saída Digital (S/PDIF)", Capability::Output),
        Device::new(4, "LG HDR 4K (NVIDIA High Definition Audio)", Capability::Output),
    ]
}

#[test]
fn exact_device_name_wins() {
    let resolver = DeviceResolver::new(&DeviceConfig::default());
    let m = resolver
        .resolve("LG HDR 4K (NVIDIA High Definition Audio)", &devices())
        .unwrap();
    assert_eq!(m.index, 4);
    assert!(m.score >= 100.0);
}

#[test]
fn accented_query_matches() {
    let resolver = DeviceResolver::new(&DeviceConfig::default());
    let m = resolver.resolve("fone de ouvido", &devices()).unwrap();
    assert_eq!(m.name, "Fone de ouvido (Logitech PRO X)");
}

#[test]
fn unrelated_query_is_not_confident() {
    let resolver = DeviceResolver::new(&DeviceConfig::default());
    match resolver.resolve("qqqq", &devices()) {
        Err(DeviceMatchError::NoConfidentMatch { score, .. }) => assert!(score < 60.0),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn configured_bonus_changes_winner() {
    let list = vec![
        Device::new(0, "Speakers Sony", Capability::Output),
        Device::new(1, "Speakers Bose", Capability::Output),
    ];
    let plain = DeviceResolver::new(&DeviceConfig::default());
    assert_eq!(plain.resolve("speakers", &list).unwrap().index, 0);

    let tuned = DeviceResolver::new(&DeviceConfig {
        bonuses: vec![BonusRule {
            tokens: vec!["bose".into()],
            points: 3.0,
        }],
        ..DeviceConfig::default()
    });
    assert_eq!(tuned.resolve("speakers", &list).unwrap().index, 1);
}
