//! Round-trip properties of the binary and JSON encodings.

use componet::codec::{self, WireFormat};
use componet::model::{Affix, Axis, Component, Components};
use proptest::prelude::*;

fn axis_strategy(rows: usize) -> impl Strategy<Value = Axis> {
    (
        "[A-Za-z ()]{1,24}",
        "[a-z_]{1,16}",
        // Quarter steps print and parse back exactly in JSON.
        prop::collection::vec((-4_000_000i64..4_000_000).prop_map(|v| v as f64 / 4.0), rows),
        prop::option::of(prop::sample::select(vec!["F", "Ω", "$", "", "F/m³", "V"])),
        prop::option::of(prop_oneof![Just(Affix::Prefix), Just(Affix::Suffix)]),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(name, shortname, data, unit, affix, computed)| Axis {
            name,
            shortname,
            data,
            unit: unit.map(str::to_string),
            affix,
            computed,
        })
}

fn component_strategy() -> impl Strategy<Value = Component> {
    (0usize..12, 0usize..4).prop_flat_map(|(rows, axes)| {
        (
            "[A-Za-z ]{1,30}",
            prop::sample::select(vec!["2022", "2023", ""]),
            prop::collection::vec("[A-Z0-9-]{1,12}", rows),
            prop::collection::vec("[A-Za-z ]{0,12}", rows),
            prop::collection::vec(axis_strategy(rows), axes),
        )
            .prop_map(|(category, year, mpns, manufacturers, axes)| Component {
                category,
                year: year.to_string(),
                mpns,
                manufacturers,
                axes,
            })
    })
}

fn components_strategy() -> impl Strategy<Value = Components> {
    prop::collection::vec(component_strategy(), 0..4).prop_map(Components::new)
}

proptest! {
    #[test]
    fn prop_binary_round_trip(components in components_strategy()) {
        let bytes = codec::encode(&components);
        let decoded = codec::decode(&bytes).unwrap();
        prop_assert_eq!(&decoded, &components);
        prop_assert_eq!(codec::encode(&decoded), bytes);
    }

    #[test]
    fn prop_json_round_trip(components in components_strategy()) {
        let json = codec::to_json(&components).unwrap();
        prop_assert_eq!(codec::from_json(&json).unwrap(), components.clone());

        let pretty = codec::to_json_pretty(&components).unwrap();
        prop_assert_eq!(codec::from_json(&pretty).unwrap(), components);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = codec::decode(&bytes);
    }
}

#[test]
fn test_encode_as_matches_direct_encoders() {
    let components = Components::new(vec![Component {
        category: "Film Capacitors".to_string(),
        year: "2022".to_string(),
        mpns: vec!["ECW-F".to_string()],
        manufacturers: vec!["Panasonic".to_string()],
        axes: vec![Axis {
            name: "Price @ 1000".to_string(),
            shortname: "part_median_price_1000_converted_price".to_string(),
            data: vec![0.42],
            unit: Some("$".to_string()),
            affix: Some(Affix::Prefix),
            computed: None,
        }],
    }]);

    assert_eq!(
        codec::encode_as(&components, WireFormat::Binary).unwrap(),
        codec::encode(&components)
    );
    assert_eq!(
        codec::encode_as(&components, WireFormat::Json).unwrap(),
        codec::to_json(&components).unwrap().into_bytes()
    );
}
