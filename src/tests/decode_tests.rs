use crate::domain::FloorType;
use crate::parser::{DecodeConfig, LocatorTable, Misalignment, PageDecoder};
use crate::tests::utils::{page_html, Card};

fn decoder() -> PageDecoder {
    PageDecoder::new(&LocatorTable::default(), DecodeConfig::default())
        .expect("default locators compile")
}

#[test]
fn decodes_every_field_of_a_listing_card() {
    let page = decoder().decode_page(&page_html(&[Card::default()]));

    assert_eq!(page.listings, 1);
    assert!(page.misalignments.is_empty(), "{:?}", page.misalignments);
    assert_eq!(page.records.len(), 1);

    let r = &page.records[0];
    assert_eq!(r.address.as_deref(), Some("锦江春熙路红星路阳光小区"));
    assert_eq!(r.community.as_deref(), Some("阳光小区"));
    assert_eq!(r.total_price, Some(250.0));
    assert_eq!(r.unit_price, Some(13400.0));
    assert_eq!(r.area, Some(89.5));
    assert_eq!(r.bedrooms, Some(3));
    assert_eq!(r.living_rooms, Some(2));
    assert_eq!(r.bathrooms, Some(1));
    assert_eq!(r.room_count, Some(6));
    assert_eq!(r.orientation.as_deref(), Some("南北"));
    assert_eq!(r.age, Some(19));
    assert_eq!(r.floor_type, Some(FloorType::Mid));
    assert_eq!(r.floor_total, Some(18));
    assert_eq!(r.housing_period.as_deref(), Some("满五年"));
    assert!(r.near_subway);
}

#[test]
fn tag_and_floor_fields_degrade_to_absent() {
    let card = Card {
        floor: "共6层",
        build_year: "暂无",
        tags: vec!["地铁附近", "满二年"],
        ..Default::default()
    };
    let page = decoder().decode_page(&page_html(&[card]));
    let r = &page.records[0];

    // unknown band, digits still count
    assert_eq!(r.floor_type, None);
    assert_eq!(r.floor_total, Some(6));
    assert_eq!(r.age, None);
    // marker must match a whole tag
    assert!(!r.near_subway);
    assert_eq!(r.housing_period.as_deref(), Some("满二年"));
}

#[test]
fn whole_stride_streams_yield_one_record_per_group() {
    let cards = vec![
        Card::default(),
        Card {
            address: ["武侯", "桐梓林", "南路"],
            community: "锦城花园",
            ..Default::default()
        },
        Card {
            address: ["高新", "天府大道", "中段"],
            community: "天府公馆",
            ..Default::default()
        },
    ];
    let page = decoder().decode_page(&page_html(&cards));

    assert_eq!(page.records.len(), 3);
    assert!(page.misalignments.is_empty());
    for r in &page.records {
        assert!(r.address.is_some());
        assert_eq!(r.room_count, Some(6));
    }
    assert_eq!(page.records[2].address.as_deref(), Some("高新天府大道中段天府公馆"));
}

#[test]
fn short_address_stream_truncates_the_trailing_group() {
    // second card only contributes two fragments: 5 fragments -> 1 group
    let cards = vec![
        Card::default(),
        Card {
            address: ["武侯", "桐梓林", ""],
            community: "锦城花园",
            ..Default::default()
        },
    ];
    let page = decoder().decode_page(&page_html(&cards));

    assert_eq!(page.records.len(), 2, "page is never rejected");
    assert!(page.misalignments.contains(&Misalignment {
        field: "address",
        expected: 2,
        actual: 1,
    }));
    assert_eq!(page.records[0].address.as_deref(), Some("锦江春熙路红星路阳光小区"));
    assert_eq!(page.records[1].address, None);
    // other streams are unaffected
    assert_eq!(page.records[1].community.as_deref(), Some("锦城花园"));
}

#[test]
fn short_value_stream_shifts_positionally_and_leaves_tail_absent() {
    let cards = vec![
        Card {
            total_price: "",
            ..Default::default()
        },
        Card {
            address: ["武侯", "桐梓林", "南路"],
            total_price: "300",
            ..Default::default()
        },
    ];
    let page = decoder().decode_page(&page_html(&cards));

    assert_eq!(
        page.misalignments,
        vec![Misalignment {
            field: "total_price",
            expected: 2,
            actual: 1,
        }]
    );
    assert_eq!(page.records[0].total_price, Some(300.0));
    assert_eq!(page.records[1].total_price, None);
}

#[test]
fn duplicate_address_keeps_first_on_page() {
    let cards = vec![
        Card::default(),
        Card {
            unit_price: "9900元/㎡",
            ..Default::default()
        },
    ];
    let page = decoder().decode_page(&page_html(&cards));

    assert_eq!(page.listings, 2);
    assert_eq!(page.duplicates, 1);
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].unit_price, Some(13400.0));
}

#[test]
fn page_without_listings_decodes_to_nothing() {
    let page = decoder().decode_page("<html><body><p>验证码</p></body></html>");
    assert_eq!(page.listings, 0);
    assert!(page.records.is_empty());
    assert!(page.misalignments.is_empty());
}

#[test]
fn bad_selector_is_a_config_error() {
    let locators = LocatorTable {
        container: "div[[".to_string(),
        ..Default::default()
    };
    assert!(PageDecoder::new(&locators, DecodeConfig::default()).is_err());
}
