use {
    crate::{
        domain::{
            Size,
            demand::Outcome,
            placement::{self, HtSlot},
            render,
            targeting::Value,
        },
        tests::setup::{self, Answer, bid, jsonp, response, setup},
    },
    serde_json::json,
};

fn ht(name: &str) -> HtSlot {
    HtSlot::from(name)
}

fn single(value: &str) -> Value {
    Value::Single(value.to_owned())
}

fn multiple(values: &[&str]) -> Value {
    Value::Multiple(values.iter().map(|value| value.to_string()).collect())
}

/// A slot with one winning placement gets scalar targeting.
#[tokio::test]
async fn single_winner() {
    let test = setup()
        .answer(|request| Answer::Body(jsonp(request, &response([bid(111, 1.23)]))))
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    assert_eq!(demand.slot.len(), 1);
    let slot = &demand.slot[&ht("htSlotA")];
    assert_eq!(slot.demand.len(), 2);
    assert_eq!(slot.demand["ix_trstx_id"], single("111"));
    assert_eq!(slot.demand["ix_trstx_cpm"], single("300x250_120"));

    let requests = test.requests();
    assert_eq!(requests.len(), 1);
    let query = &requests[0].query;
    assert_eq!(query.auids, vec![111, 222]);
    assert_eq!(query.u, setup::PAGE_URL);
    assert_eq!(query.pt, "net");
    assert_eq!(
        query.cb,
        format!(
            r#"window.headertag["TRSTX"].callback("{}")"#,
            setup::token(&requests[0])
        )
    );
    assert_eq!(requests[0].url.as_str(), "https://sofia.trustx.org/hb");

    assert_eq!(test.adapter.pending(), 0);
    assert_eq!(test.syncs(), 1);
    let reports = test.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, Outcome::Success);
    assert_eq!(
        reports[0].placements,
        vec![placement::Id(111), placement::Id(222)]
    );
}

/// Several winning placements give arrays in mapping order, whatever the
/// order of the response.
#[tokio::test]
async fn several_winners() {
    let test = setup()
        .answer(|request| {
            Answer::Body(jsonp(
                request,
                &response([bid(222, 0.5), bid(111, 1.23)]),
            ))
        })
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    let slot = &demand.slot[&ht("htSlotA")];
    assert_eq!(slot.demand["ix_trstx_id"], multiple(&["111", "222"]));
    assert_eq!(
        slot.demand["ix_trstx_cpm"],
        multiple(&["300x250_120", "300x250_50"])
    );
    assert!(!slot.demand.contains_key("ix_trstx_dealid"));
}

#[tokio::test]
async fn no_winner() {
    let test = setup().build();

    let demand = test.demand(&["htSlotA", "htSlotB"]).await.unwrap();

    assert!(demand.slot.is_empty());
    assert_eq!(test.requests().len(), 1);
}

#[tokio::test]
async fn unrequested_bids_are_discarded() {
    let test = setup()
        .answer(|request| Answer::Body(jsonp(request, &response([bid(999, 1.23)]))))
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    assert!(demand.slot.is_empty());
    assert_eq!(
        test.adapter
            .creatives()
            .get(placement::Id(999), Size::new(300, 250)),
        None
    );
}

#[tokio::test]
async fn deals() {
    let test = setup()
        .answer(|request| {
            let mut deal = bid(111, 1.23);
            deal["dealid"] = json!("d-1");
            Answer::Body(jsonp(request, &response([deal])))
        })
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    let slot = &demand.slot[&ht("htSlotA")];
    assert_eq!(slot.demand["ix_trstx_id"], single("111"));
    assert_eq!(slot.demand["ix_trstx_cpm"], single("300x250_120"));
    assert_eq!(slot.demand["ix_trstx_dealid"], single("300x250_d-1"));
}

#[tokio::test]
async fn private_market_deals() {
    let test = setup()
        .config("targetKeyOverride", json!({ "pmKey": "ix_trstx_pm" }))
        .config("dealTargeting", json!("privateMarket"))
        .answer(|request| {
            let mut deal = bid(111, 1.23);
            deal["dealid"] = json!("d-1");
            Answer::Body(jsonp(request, &response([deal, bid(222, 0.5)])))
        })
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    let slot = &demand.slot[&ht("htSlotA")];
    assert_eq!(slot.demand["ix_trstx_id"], multiple(&["111", "222"]));
    assert_eq!(slot.demand["ix_trstx_pm"], single("300x250_120"));
    assert_eq!(slot.demand["ix_trstx_cpm"], single("300x250_50"));
    assert_eq!(slot.demand["ix_trstx_dealid"], single("300x250_d-1"));
}

/// A placement shared by two slots is requested once and its bid only counts
/// for the slot whose xSlot asked for it first.
#[tokio::test]
async fn shared_placements() {
    let test = setup()
        .answer(|request| {
            Answer::Body(jsonp(request, &response([bid(111, 1.23), bid(444, 2.0)])))
        })
        .build();

    let demand = test.demand(&["htSlotA", "htSlotB"]).await.unwrap();

    assert_eq!(test.requests()[0].query.auids, vec![111, 222, 444]);
    assert_eq!(
        demand.slot.keys().map(|slot| slot.0.as_str()).collect::<Vec<_>>(),
        vec!["htSlotA", "htSlotB"]
    );
    assert_eq!(
        demand.slot[&ht("htSlotA")].demand["ix_trstx_id"],
        single("111")
    );
    assert_eq!(
        demand.slot[&ht("htSlotB")].demand["ix_trstx_id"],
        single("444")
    );
}

#[tokio::test]
async fn shared_placements_follow_request_order() {
    let test = setup()
        .answer(|request| Answer::Body(jsonp(request, &response([bid(111, 1.23)]))))
        .build();

    let demand = test.demand(&["htSlotB", "htSlotA"]).await.unwrap();

    assert_eq!(test.requests()[0].query.auids, vec![111, 444, 222]);
    assert_eq!(
        demand.slot.keys().cloned().collect::<Vec<_>>(),
        vec![ht("htSlotB")]
    );
    assert_eq!(
        demand.slot[&ht("htSlotB")].demand["ix_trstx_id"],
        single("111")
    );
}

#[tokio::test]
async fn unusable_bids_are_dropped() {
    let test = setup()
        .config("roundingBuckets", json!({ "floor": 50 }))
        .answer(|request| {
            let mut no_creative = bid(111, 1.23);
            no_creative["adm"] = serde_json::Value::Null;
            let mut empty_creative = bid(111, 1.5);
            empty_creative["adm"] = json!("");
            Answer::Body(jsonp(
                request,
                // Placement 444 bids twice, the first bid counts.
                &response([
                    no_creative,
                    empty_creative,
                    bid(222, 0.49),
                    bid(444, 0.75),
                    bid(444, 3.0),
                ]),
            ))
        })
        .build();

    let demand = test.demand(&["htSlotA", "htSlotB"]).await.unwrap();

    assert!(!demand.slot.contains_key(&ht("htSlotA")));
    let slot = &demand.slot[&ht("htSlotB")];
    assert_eq!(slot.demand["ix_trstx_id"], single("444"));
    assert_eq!(slot.demand["ix_trstx_cpm"], single("300x250_75"));
}

/// A price beyond the decimal range only costs its own bid.
#[tokio::test]
async fn out_of_range_prices_are_dropped() {
    let test = setup()
        .answer(|request| {
            let mut huge = bid(111, 1.0);
            huge["price"] = json!("7922816251426433759354395033");
            Answer::Body(jsonp(request, &response([huge, bid(222, 1.5)])))
        })
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    let slot = &demand.slot[&ht("htSlotA")];
    assert_eq!(slot.demand["ix_trstx_id"], single("222"));
    assert_eq!(slot.demand["ix_trstx_cpm"], single("300x250_150"));
    assert_eq!(
        test.adapter
            .creatives()
            .get(placement::Id(111), Size::new(300, 250)),
        None
    );
}

/// Unknown slots are skipped, and nothing is requested if no slot resolves.
#[tokio::test]
async fn unknown_slots() {
    let test = setup().build();

    let demand = test.demand(&["nope"]).await.unwrap();

    assert!(demand.slot.is_empty());
    assert!(test.requests().is_empty());
    assert!(test.reports().is_empty());
}

#[tokio::test]
async fn bare_json_responses() {
    let test = setup()
        .answer(|_| Answer::Body(response([bid(111, 1.23)]).to_string()))
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();

    assert_eq!(
        demand.slot[&ht("htSlotA")].demand["ix_trstx_id"],
        single("111")
    );
}

#[derive(Default)]
struct Page {
    written: String,
}

impl render::Document for Page {
    fn write(&mut self, markup: &str) {
        self.written.push_str(markup);
    }

    fn close(&mut self) {}

    fn frame(&mut self) -> Option<&mut dyn render::Frame> {
        None
    }
}

/// The creatives of a response can be rendered with the targeting the demand
/// carries.
#[tokio::test]
async fn render_from_demand() {
    let test = setup()
        .config("sizeRetargeting", json!({ "1x1": [300, 250] }))
        .answer(|request| Answer::Body(jsonp(request, &response([bid(111, 1.23)]))))
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();
    let targeting = &demand.slot[&ht("htSlotA")].demand;

    let mut page = Page::default();
    test.adapter
        .render_ad(&mut page, targeting, Size::new(300, 250));
    assert_eq!(page.written, "<div>111</div>");

    let mut page = Page::default();
    test.adapter.render_ad(&mut page, targeting, Size::new(1, 1));
    assert_eq!(page.written, "<div>111</div>");

    let mut page = Page::default();
    test.adapter.render_ad(&mut page, targeting, Size::new(728, 90));
    assert!(page.written.is_empty());
}

#[tokio::test]
async fn demand_serializes_for_the_wrapper() {
    let test = setup()
        .answer(|request| Answer::Body(jsonp(request, &response([bid(111, 1.23)]))))
        .build();

    let demand = test.demand(&["htSlotA"]).await.unwrap();
    let value = serde_json::to_value(&demand).unwrap();

    assert_eq!(
        value["slot"]["htSlotA"]["demand"],
        json!({ "ix_trstx_id": "111", "ix_trstx_cpm": "300x250_120" })
    );
    assert!(value["slot"]["htSlotA"]["timestamp"].is_i64());
}
