//! Spot-family canonicalizers.
//!
//! One pure transformation per event kind, each an explicit field-descriptor
//! table (plus bespoke handling for nested objects and derived fields).
//! Wire field references: <https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams>

use serde_json::{Map, Value, json};

use crate::endpoint::Family;
use crate::envelope::{self, Envelope};
use crate::error::NormalizeError;
use crate::fields::{self, FieldSpec};

/// Stream type reported for user-data events, which arrive outside any
/// combined-stream wrapper.
const USER_DATA_STREAM: &str = "!userData@arr";

/// Dispatch a spot event to its canonicalizer.
pub(crate) fn canonicalize(
    env: &Envelope<'_>,
    code: &str,
) -> Result<Map<String, Value>, NormalizeError> {
    match code {
        "aggTrade" => agg_trade(env),
        "trade" => trade(env),
        "bookTicker" => book_ticker(env),
        "kline" => kline(env),
        "24hrMiniTicker" => mini_ticker(env),
        "24hrTicker" => ticker(env),
        "depth" => depth_snapshot(env),
        "depthUpdate" => depth_update(env),
        "outboundAccountInfo" => account_info(env),
        "outboundAccountPosition" => account_position(env),
        "balanceUpdate" => balance_update(env),
        "executionReport" => execution_report(env),
        "listStatus" => list_status(env),
        other => Err(NormalizeError::UnrecognizedEvent {
            family: Family::Spot,
            code: other.to_owned(),
        }),
    }
}

fn agg_trade(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "aggTrade";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(KIND)?));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("aggregate_trade_id", "a"),
            FieldSpec::req("price", "p"),
            FieldSpec::req("quantity", "q"),
            FieldSpec::req("first_trade_id", "f"),
            FieldSpec::req("last_trade_id", "l"),
            FieldSpec::req("trade_time", "T"),
            FieldSpec::req("is_market_maker", "m"),
            FieldSpec::req("ignore", "M"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn trade(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "trade";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(KIND)?));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("trade_id", "t"),
            FieldSpec::req("price", "p"),
            FieldSpec::req("quantity", "q"),
            FieldSpec::req("buyer_order_id", "b"),
            FieldSpec::req("seller_order_id", "a"),
            FieldSpec::req("trade_time", "T"),
            FieldSpec::req("is_market_maker", "m"),
            FieldSpec::req("ignore", "M"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn book_ticker(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "bookTicker";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(KIND)?));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("order_book_update_id", "u"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("best_bid_price", "b"),
            FieldSpec::req("best_bid_quantity", "B"),
            FieldSpec::req("best_ask_price", "a"),
            FieldSpec::req("best_ask_quantity", "A"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn kline(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "kline";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(KIND)?));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
        ],
        &mut rec,
    )?;

    let k = fields::object(KIND, env.data, "k")?;
    let mut kline = Map::new();
    fields::apply(
        KIND,
        k,
        &[
            FieldSpec::req("kline_start_time", "t"),
            FieldSpec::req("kline_close_time", "T"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("interval", "i"),
            FieldSpec::req("open_price", "o"),
            FieldSpec::req("close_price", "c"),
            FieldSpec::req("high_price", "h"),
            FieldSpec::req("low_price", "l"),
            FieldSpec::req("base_volume", "v"),
            FieldSpec::req("number_of_trades", "n"),
            FieldSpec::req("is_closed", "x"),
            FieldSpec::req("quote", "q"),
            FieldSpec::req("taker_by_base_asset_volume", "V"),
            FieldSpec::req("taker_by_quote_asset_volume", "Q"),
            FieldSpec::req("ignore", "B"),
        ],
        &mut kline,
    )?;
    // Trade ids live at the event level and are omitted by the exchange on
    // the first interval of a session.
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::or_false("first_trade_id", "f"),
            FieldSpec::or_false("last_trade_id", "L"),
        ],
        &mut kline,
    )?;
    rec.insert("kline".to_owned(), Value::Object(kline));
    Ok(rec)
}

fn mini_ticker(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    envelope::broadcast(
        "24hrMiniTicker",
        env,
        "!miniTicker@arr",
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("close_price", "c"),
            FieldSpec::req("open_price", "o"),
            FieldSpec::req("high_price", "h"),
            FieldSpec::req("low_price", "l"),
            FieldSpec::req("taker_by_base_asset_volume", "v"),
            FieldSpec::req("taker_by_quote_asset_volume", "q"),
        ],
    )
}

fn ticker(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    envelope::broadcast(
        "24hrTicker",
        env,
        "!ticker@arr",
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("price_change", "p"),
            FieldSpec::req("price_change_percent", "P"),
            FieldSpec::req("weighted_average_price", "w"),
            FieldSpec::req("trade_before_24h_window", "x"),
            FieldSpec::req("last_price", "c"),
            FieldSpec::req("last_quantity", "Q"),
            FieldSpec::req("best_bid_price", "b"),
            FieldSpec::req("best_bid_quantity", "B"),
            FieldSpec::req("best_ask_price", "a"),
            FieldSpec::req("best_ask_quantity", "A"),
            FieldSpec::req("open_price", "o"),
            FieldSpec::req("high_price", "h"),
            FieldSpec::req("low_price", "l"),
            FieldSpec::req("total_traded_base_asset_volume", "v"),
            FieldSpec::req("total_traded_quote_asset_volume", "q"),
            FieldSpec::req("statistics_open_time", "O"),
            FieldSpec::req("statistics_close_time", "C"),
            FieldSpec::req("first_trade_id", "F"),
            FieldSpec::req("last_trade_id", "L"),
            FieldSpec::req("total_nr_of_trades", "n"),
        ],
    )
}

/// Partial order-book snapshot. The payload body carries no symbol; it is
/// derived from the stream name (`btcusdt@depth5` -> `BTCUSDT`).
fn depth_snapshot(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "depth";
    let stream = env.stream(KIND)?;
    let symbol = stream
        .split('@')
        .next()
        .unwrap_or(stream)
        .to_uppercase();
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(stream));
    rec.insert("symbol".to_owned(), json!(symbol));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("last_update_id", "lastUpdateId"),
            FieldSpec::req("bids", "bids"),
            FieldSpec::req("asks", "asks"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn depth_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "depthUpdate";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(KIND)?));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("first_update_id_in_event", "U"),
            FieldSpec::req("final_update_id_in_event", "u"),
            FieldSpec::req("bids", "b"),
            FieldSpec::req("asks", "a"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

/// Balance rows shared by the account-info and account-position events.
const BALANCE_SPECS: [FieldSpec; 3] = [
    FieldSpec::req("asset", "a"),
    FieldSpec::req("free", "f"),
    FieldSpec::req("locked", "l"),
];

fn account_info(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "outboundAccountInfo";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(USER_DATA_STREAM));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("maker_commission_rate", "m"),
            FieldSpec::req("taker_commission_rate", "t"),
            FieldSpec::req("buyer_commission_rate", "b"),
            FieldSpec::req("seller_commission_rate", "s"),
            FieldSpec::req("can_trade", "T"),
            FieldSpec::req("can_withdraw", "W"),
            FieldSpec::req("can_deposit", "D"),
            FieldSpec::req("account_permissions", "P"),
        ],
        &mut rec,
    )?;
    let balances = fields::map_list(KIND, env.data, "B", &BALANCE_SPECS)?;
    rec.insert("balances".to_owned(), Value::Array(balances));
    Ok(rec)
}

fn account_position(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "outboundAccountPosition";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(USER_DATA_STREAM));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("last_update_time", "u"),
        ],
        &mut rec,
    )?;
    let balances = fields::map_list(KIND, env.data, "B", &BALANCE_SPECS)?;
    rec.insert("balances".to_owned(), Value::Array(balances));
    Ok(rec)
}

fn balance_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "balanceUpdate";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(USER_DATA_STREAM));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("asset", "a"),
            FieldSpec::req("balance_delta", "d"),
            FieldSpec::req("clear_time", "T"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn execution_report(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "executionReport";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(USER_DATA_STREAM));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("client_order_id", "c"),
            FieldSpec::req("side", "S"),
            FieldSpec::req("order_type", "o"),
            FieldSpec::req("time_in_force", "f"),
            FieldSpec::req("order_quantity", "q"),
            FieldSpec::req("order_price", "p"),
            FieldSpec::req("stop_price", "P"),
            FieldSpec::req("iceberg_quantity", "F"),
            FieldSpec::req("ignore_g", "g"),
            FieldSpec::req("original_client_order_id", "C"),
            FieldSpec::req("current_execution_type", "x"),
            FieldSpec::req("current_order_status", "X"),
            FieldSpec::req("order_reject_reason", "r"),
            FieldSpec::req("order_id", "i"),
            FieldSpec::req("last_executed_quantity", "l"),
            FieldSpec::req("cumulative_filled_quantity", "z"),
            FieldSpec::req("last_executed_price", "L"),
            FieldSpec::req("commission_amount", "n"),
            FieldSpec::req("commission_asset", "N"),
            FieldSpec::req("transaction_time", "T"),
            FieldSpec::req("trade_id", "t"),
            FieldSpec::req("ignore_I", "I"),
            FieldSpec::req("is_order_working", "w"),
            FieldSpec::req("is_trade_maker_side", "m"),
            FieldSpec::req("ignore_M", "M"),
            FieldSpec::req("order_creation_time", "O"),
            FieldSpec::req("cumulative_quote_asset_transacted_quantity", "Z"),
            FieldSpec::req("last_quote_asset_transacted_quantity", "Y"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn list_status(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "listStatus";
    let symbol = fields::string(KIND, env.data, "s")?;
    let mut rec = Map::new();
    rec.insert(
        "stream_type".to_owned(),
        json!(format!("{}@listStatus", symbol.to_lowercase())),
    );
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("order_list_id", "g"),
            FieldSpec::req("contingency_type", "c"),
            FieldSpec::req("list_status_type", "l"),
            FieldSpec::req("list_order_status", "L"),
            FieldSpec::req("list_reject_reason", "r"),
            FieldSpec::req("list_client_order_id", "C"),
            FieldSpec::req("transaction_time", "T"),
        ],
        &mut rec,
    )?;
    let objects = fields::map_list(
        KIND,
        env.data,
        "O",
        &[
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("order_id", "i"),
            FieldSpec::req("client_order_id", "c"),
        ],
    )?;
    rec.insert("objects".to_owned(), Value::Array(objects));
    Ok(rec)
}
