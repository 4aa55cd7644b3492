use {
    crate::{
        domain::demand::{Error, Outcome},
        tests::setup::{Answer, bid, jsonp, response, setup},
    },
    serde_json::json,
};

#[tokio::test]
async fn transport_failure() {
    let test = setup()
        .answer(|_| Answer::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
        .build();

    let err = test.demand(&["htSlotA"]).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(
        err.to_string(),
        "Unable to get demand from trustx, 503 received"
    );
    assert_eq!(test.adapter.pending(), 0);
    assert_eq!(test.syncs(), 0);
    assert_eq!(test.reports()[0].outcome, Outcome::Transport);
}

/// A body without `seatbid` is a failure, not an empty demand.
#[tokio::test]
async fn missing_seatbid() {
    let test = setup()
        .answer(|request| Answer::Body(jsonp(request, &json!({}))))
        .build();

    let err = test.demand(&["htSlotA"]).await.unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert!(
        err.to_string()
            .starts_with("Unable to get demand from trustx, error missing field `seatbid`"),
        "{err}"
    );
    assert_eq!(test.reports()[0].outcome, Outcome::Parse);
}

#[tokio::test]
async fn malformed_payloads() {
    for payload in ["", "<html>503</html>", "window.evil(\"t\")({});"] {
        let test = setup()
            .answer(move |_| Answer::Body(payload.to_owned()))
            .build();

        let err = test.demand(&["htSlotA"]).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unable to get demand from trustx, wrong response was received",
            "{payload:?}"
        );
    }
}

/// The answer has to carry the token of the request it answers.
#[tokio::test]
async fn foreign_token() {
    let test = setup()
        .answer(|_| {
            Answer::Body(format!(
                r#"window.headertag["TRSTX"].callback("0000000000000000")({});"#,
                response([bid(111, 1.23)])
            ))
        })
        .build();

    let err = test.demand(&["htSlotA"]).await.unwrap_err();

    assert!(matches!(err, Error::WrongResponse));
    assert_eq!(test.adapter.pending(), 0);
}

/// Failed calls leave nothing behind and do not affect later calls.
#[tokio::test]
async fn recovers_after_failure() {
    let calls = std::sync::atomic::AtomicUsize::new(0);
    let test = setup()
        .answer(move |request| {
            match calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) {
                0 => Answer::Status(reqwest::StatusCode::BAD_GATEWAY),
                _ => Answer::Body(jsonp(request, &response([bid(111, 1.23)]))),
            }
        })
        .build();

    assert!(test.demand(&["htSlotA"]).await.is_err());
    let demand = test.demand(&["htSlotA"]).await.unwrap();

    assert_eq!(demand.slot.len(), 1);
    assert_eq!(test.adapter.pending(), 0);
}
