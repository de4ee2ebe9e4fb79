// tests/trade_flow.rs - End-to-end order flow through TradeClient
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::mpsc::UnboundedReceiver;

use trader_oms::{
    fix::tags, prelude::*, ChannelTransport, CorrelationOutcome, OutboundMessage,
};

/// Deterministic ClOrdIDs with a recognisable prefix
#[derive(Default)]
struct PrefixedGenerator {
    issued: Mutex<u64>,
}

impl ClOrdIdGenerator for PrefixedGenerator {
    fn next(&self) -> ClOrdId {
        let mut issued = self.issued.lock();
        *issued += 1;
        format!("T{:04}", *issued)
    }
}

fn session() -> SessionId {
    SessionId::new("FIX.4.2", "TW", "ISLD")
}

fn setup(generator: Arc<dyn ClOrdIdGenerator>) -> (Arc<TradeClient>, UnboundedReceiver<OutboundMessage>) {
    let (transport, rx) = ChannelTransport::new();
    let client = TradeClient::new(generator, FixFactory::default(), Arc::new(transport));
    client.on_session_created(session());
    (Arc::new(client), rx)
}

fn ibm_limit() -> OrderRequest {
    OrderRequest {
        symbol: "IBM".to_string(),
        side: OrderSide::Buy,
        ord_type: OrderType::Limit,
        quantity: "100".to_string(),
        price: Some("50.25".to_string()),
        stop_price: None,
        account: None,
        session_id: session().to_string(),
        security_type: None,
        maturity_month_year: None,
        maturity_day: None,
        put_or_call: None,
        strike_price: None,
    }
}

fn execution_report(clord_id: &str, cum_qty: &str, avg_px: &str, leaves_qty: &str) -> InboundMessage {
    InboundMessage::new("8")
        .with(tags::CL_ORD_ID, clord_id)
        .with(tags::CUM_QTY, cum_qty)
        .with(tags::AVG_PX, avg_px)
        .with(tags::LEAVES_QTY, leaves_qty)
}

#[tokio::test]
async fn submit_fill_and_cancel() {
    let (client, mut rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));

    // Submit
    let order = client.submit_order(ibm_limit()).await.unwrap();
    assert_eq!(order.clord_id, "1");

    let nos = rx.recv().await.unwrap();
    assert_eq!(nos.session, session());
    assert_eq!(nos.message.msg_type(), "D");
    assert_eq!(nos.message.get(tags::CL_ORD_ID), Some("1"));
    assert_eq!(nos.message.get(tags::SYMBOL), Some("IBM"));
    assert_eq!(nos.message.get(tags::PRICE), Some("50.25"));
    assert_eq!(nos.message.get(tags::ORDER_QTY), Some("100"));
    assert!(nos.message.has(tags::TRANSACT_TIME));

    // Partial fill
    let report = execution_report("1", "40", "50.20", "60")
        .with(tags::LAST_SHARES, "40")
        .with(tags::LAST_PX, "50.20");
    let outcome = client.deliver(&report, &session()).unwrap();
    assert!(matches!(outcome, CorrelationOutcome::Applied { execution: Some(_), .. }));

    let filled = client.get_order(order.id).unwrap();
    assert_eq!(filled.closed, dec!(40));
    assert_eq!(filled.open, dec!(60));
    assert_eq!(filled.avg_px, Some(dec!(50.20)));

    let executions = client.list_executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].symbol, "IBM");
    assert_eq!(executions[0].quantity, dec!(40));
    assert_eq!(client.get_execution(executions[0].id).unwrap(), executions[0]);

    // Cancel
    client.cancel_order(order.id).await.unwrap();
    let cancel = rx.recv().await.unwrap();
    assert_eq!(cancel.message.msg_type(), "F");
    assert_eq!(cancel.message.get(tags::CL_ORD_ID), Some("2"));
    assert_eq!(cancel.message.get(tags::ORIG_CL_ORD_ID), Some("1"));

    // Cancel confirmation arrives under the new ClOrdID
    client
        .deliver(&execution_report("2", "40", "50.20", "0"), &session())
        .unwrap();
    let done = client.get_order(order.id).unwrap();
    assert_eq!(done.open, dec!(0));
    assert_eq!(done.closed, dec!(40));
    assert_eq!(client.list_executions().len(), 1);
}

#[tokio::test]
async fn fake_generator_drives_clord_ids() {
    let (client, mut rx) = setup(Arc::new(PrefixedGenerator::default()));

    let order = client.submit_order(ibm_limit()).await.unwrap();
    assert_eq!(order.clord_id, "T0001");
    assert_eq!(rx.recv().await.unwrap().message.get(tags::CL_ORD_ID), Some("T0001"));

    client.cancel_order(order.id).await.unwrap();
    let cancel = rx.recv().await.unwrap();
    assert_eq!(cancel.message.get(tags::CL_ORD_ID), Some("T0002"));
    assert_eq!(cancel.message.get(tags::ORIG_CL_ORD_ID), Some("T0001"));
}

#[tokio::test]
async fn unmatched_report_changes_nothing() {
    let (client, _rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));
    let order = client.submit_order(ibm_limit()).await.unwrap();

    let outcome = client
        .deliver(&execution_report("999", "40", "50.20", "60"), &session())
        .unwrap();
    assert!(matches!(outcome, CorrelationOutcome::Unmatched { ref clord_id } if clord_id == "999"));
    assert_eq!(client.list_orders(), vec![order]);
    assert!(client.list_executions().is_empty());
}

#[tokio::test]
async fn malformed_report_is_rejected() {
    let (client, _rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));
    let order = client.submit_order(ibm_limit()).await.unwrap();

    let missing_clord_id = InboundMessage::new("8").with(tags::CUM_QTY, "40");
    assert!(matches!(
        client.deliver(&missing_clord_id, &session()),
        Err(OmsError::MalformedMessage { .. })
    ));

    let bad_avg_px = execution_report("1", "40", "n/a", "60");
    assert!(client.deliver(&bad_avg_px, &session()).is_err());
    assert_eq!(client.get_order(order.id).unwrap(), order);
}

#[tokio::test]
async fn raw_report_text_round_trip() {
    let (client, _rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));
    let order = client.submit_order(ibm_limit()).await.unwrap();

    let msg = InboundMessage::parse("8=FIX.4.2\x0135=8\x0149=ISLD\x0156=TW\x0111=1\x0114=100\x016=50.25\x01151=0\x01")
        .unwrap();
    let local = msg.local_session().unwrap();
    assert_eq!(local, session());
    client.deliver(&msg, &local).unwrap();

    let order = client.get_order(order.id).unwrap();
    assert_eq!(order.closed, dec!(100));
    assert_eq!(order.open, dec!(0));
}

#[tokio::test]
async fn fractional_quantity_is_rejected_before_sending() {
    let (client, mut rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));

    let mut request = ibm_limit();
    request.quantity = "100.5".to_string();
    assert!(matches!(client.submit_order(request).await, Err(OmsError::Validation(_))));
    assert!(client.list_orders().is_empty());
    assert!(rx.try_recv().is_err());

    // With one decimal place configured the same draft goes out unchanged
    let (transport, mut rx) = ChannelTransport::new();
    let client = TradeClient::new(
        Arc::new(SequentialClOrdIdGenerator::new()),
        FixFactory::new(2, 1),
        Arc::new(transport),
    );
    client.on_session_created(session());
    let mut request = ibm_limit();
    request.quantity = "100.5".to_string();
    let order = client.submit_order(request).await.unwrap();
    assert_eq!(order.open, dec!(100.5));
    assert_eq!(rx.recv().await.unwrap().message.get(tags::ORDER_QTY), Some("100.5"));
}

#[tokio::test]
async fn repeating_generator_cannot_hijack_an_order() {
    struct Constant;

    impl ClOrdIdGenerator for Constant {
        fn next(&self) -> ClOrdId {
            "X".to_string()
        }
    }

    let (client, mut rx) = setup(Arc::new(Constant));
    let ibm = client.submit_order(ibm_limit()).await.unwrap();
    rx.recv().await.unwrap();

    let mut msft = ibm_limit();
    msft.symbol = "MSFT".to_string();
    assert!(matches!(
        client.submit_order(msft).await,
        Err(OmsError::DuplicateClOrdId(id)) if id == "X"
    ));
    assert!(rx.try_recv().is_err());

    // Fills for "X" still land on the IBM order
    client
        .deliver(&execution_report("X", "100", "50.25", "0"), &session())
        .unwrap();
    let filled = client.get_order(ibm.id).unwrap();
    assert_eq!(filled.symbol, "IBM");
    assert_eq!(filled.closed, dec!(100));
    assert_eq!(client.list_orders().len(), 1);
}

#[tokio::test]
async fn report_text_may_contain_pipes() {
    let (client, _rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));
    let order = client.submit_order(ibm_limit()).await.unwrap();

    let msg = InboundMessage::parse(
        "8=FIX.4.2\x0135=8\x0149=ISLD\x0156=TW\x0111=1\x0114=40\x016=50.25\x0158=fill a|b\x01151=60\x01",
    )
    .unwrap();
    client.deliver(&msg, &msg.local_session().unwrap()).unwrap();
    assert_eq!(client.get_order(order.id).unwrap().closed, dec!(40));
}

#[tokio::test]
async fn option_order_keeps_contract_fields() {
    let (client, mut rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));

    let mut request = ibm_limit();
    request.price = Some("2.15".to_string());
    request.security_type = Some("OPT".to_string());
    request.maturity_month_year = Some("202412".to_string());
    request.maturity_day = Some(20);
    request.put_or_call = Some(PutOrCall::Put);
    request.strike_price = Some("145".to_string());

    let order = client.submit_order(request).await.unwrap();
    assert_eq!(order.security_type.as_deref(), Some("OPT"));
    assert_eq!(order.put_or_call, Some(PutOrCall::Put));
    assert_eq!(order.strike_price, Some(dec!(145)));
    assert_eq!(client.get_order(order.id).unwrap(), order);

    // The NewOrderSingle is the same shape as for an equity order
    let nos = rx.recv().await.unwrap();
    assert_eq!(nos.message.get(tags::PRICE), Some("2.15"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_submissions_get_unique_clord_ids() {
    let (client, mut rx) = setup(Arc::new(SequentialClOrdIdGenerator::new()));
    let callers = 150;

    let handles: Vec<_> = (0..callers)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let mut request = ibm_limit();
                request.quantity = (i + 1).to_string();
                client.submit_order(request).await.unwrap()
            })
        })
        .collect();

    let mut clord_ids = HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap();
        assert!(clord_ids.insert(order.clord_id));
    }
    assert_eq!(clord_ids.len(), callers);

    let mut sent = HashSet::new();
    for _ in 0..callers {
        let out = rx.recv().await.unwrap();
        sent.insert(out.message.get(tags::CL_ORD_ID).unwrap().to_string());
    }
    assert_eq!(sent, clord_ids);

    // Internal IDs and ClOrdIDs were issued together
    let orders = client.list_orders();
    for pair in orders.windows(2) {
        let a: u64 = pair[0].clord_id.parse().unwrap();
        let b: u64 = pair[1].clord_id.parse().unwrap();
        assert!(a < b);
    }
}

#[tokio::test]
async fn every_version_renders_limit_price() {
    let (transport, mut rx) = ChannelTransport::new();
    let client = TradeClient::new(
        Arc::new(SequentialClOrdIdGenerator::new()),
        FixFactory::default(),
        Arc::new(transport),
    );

    for begin_string in ["FIX.4.0", "FIX.4.1", "FIX.4.2", "FIX.4.3", "FIX.4.4", "FIXT.1.1"] {
        let session = SessionId::new(begin_string, "TW", "ISLD");
        client.on_session_created(session.clone());

        let mut request = ibm_limit();
        request.session_id = session.to_string();
        client.submit_order(request).await.unwrap();

        let out = rx.recv().await.unwrap();
        assert_eq!(out.message.begin_string(), begin_string);
        assert_eq!(out.message.get(tags::PRICE), Some("50.25"), "{begin_string}");
    }
}
