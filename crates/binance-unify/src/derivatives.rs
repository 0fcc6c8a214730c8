//! Derivatives-family canonicalizers (USD-M and COIN-M futures).
//!
//! A superset of the spot catalog with futures-only kinds (mark/index price,
//! liquidations, account events) and variants of shared kinds carrying extra
//! fields (pair, contract type, position side). Several account-event fields
//! are included only when the source key is present; the presence check, not
//! the value, governs inclusion.
//! Wire field references: <https://developers.binance.com/docs/derivatives/usds-margined-futures/websocket-market-streams>

use serde_json::{Map, Value, json};

use crate::endpoint::Family;
use crate::envelope::{self, Envelope};
use crate::error::NormalizeError;
use crate::fields::{self, FieldSpec};

/// Dispatch a derivatives event to its canonicalizer.
pub(crate) fn canonicalize(
    env: &Envelope<'_>,
    code: &str,
) -> Result<Map<String, Value>, NormalizeError> {
    match code {
        "aggTrade" => agg_trade(env),
        "kline" => kline(env, "kline"),
        "continuous_kline" => kline(env, "continuous_kline"),
        "indexPrice_kline" => price_kline(env, "indexPrice_kline"),
        "markPrice_kline" => price_kline(env, "markPrice_kline"),
        "bookTicker" => book_ticker(env),
        "indexPriceUpdate" => index_price_update(env),
        "markPriceUpdate" => mark_price_update(env),
        "forceOrder" => force_order(env),
        "compositeIndex" => composite_index(env),
        "24hrMiniTicker" => mini_ticker(env),
        "24hrTicker" => ticker(env),
        "depthUpdate" => depth_update(env),
        "ORDER_TRADE_UPDATE" => order_trade_update(env),
        "ACCOUNT_UPDATE" => account_update(env),
        "MARGIN_CALL" => margin_call(env),
        "ACCOUNT_CONFIG_UPDATE" => account_config_update(env),
        other => Err(NormalizeError::UnrecognizedEvent {
            family: Family::Derivatives,
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
        ],
        &mut rec,
    )?;
    Ok(rec)
}

/// `kline` and `continuous_kline`. Symbol-keyed streams carry `s` at the
/// event level and inside the kline object; continuous-contract streams
/// carry `ps` (pair) and `ct` (contract type) instead.
fn kline(env: &Envelope<'_>, kind: &'static str) -> Result<Map<String, Value>, NormalizeError> {
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(kind)?));
    fields::apply(
        kind,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
        ],
        &mut rec,
    )?;

    let k = fields::object(kind, env.data, "k")?;
    let mut kline = Map::new();
    fields::apply(
        kind,
        k,
        &[
            FieldSpec::req("kline_start_time", "t"),
            FieldSpec::req("kline_close_time", "T"),
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
        ],
        &mut kline,
    )?;
    fields::apply(
        kind,
        env.data,
        &[
            FieldSpec::or_false("first_trade_id", "f"),
            FieldSpec::or_false("last_trade_id", "L"),
        ],
        &mut kline,
    )?;

    if env.data.contains_key("s") && k.contains_key("s") {
        fields::apply(kind, env.data, &[FieldSpec::req("symbol", "s")], &mut rec)?;
        fields::apply(kind, k, &[FieldSpec::req("symbol", "s")], &mut kline)?;
    } else {
        fields::apply(
            kind,
            env.data,
            &[
                FieldSpec::req("pair", "ps"),
                FieldSpec::req("contract_type", "ct"),
            ],
            &mut rec,
        )?;
    }
    rec.insert("kline".to_owned(), Value::Object(kline));
    Ok(rec)
}

/// `indexPrice_kline` and `markPrice_kline`; the mark-price variant also
/// carries a symbol inside the kline object.
fn price_kline(
    env: &Envelope<'_>,
    kind: &'static str,
) -> Result<Map<String, Value>, NormalizeError> {
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!(env.stream(kind)?));
    fields::apply(
        kind,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("pair", "ps"),
        ],
        &mut rec,
    )?;

    let k = fields::object(kind, env.data, "k")?;
    let mut kline = Map::new();
    fields::apply(
        kind,
        k,
        &[
            FieldSpec::req("kline_start_time", "t"),
            FieldSpec::req("kline_close_time", "T"),
            FieldSpec::req("interval", "i"),
            FieldSpec::req("open_price", "o"),
            FieldSpec::req("close_price", "c"),
            FieldSpec::req("high_price", "h"),
            FieldSpec::req("low_price", "l"),
            FieldSpec::req("number_of_basic_data", "n"),
            FieldSpec::req("is_closed", "x"),
        ],
        &mut kline,
    )?;
    if kind == "markPrice_kline" {
        fields::apply(kind, k, &[FieldSpec::req("symbol", "s")], &mut kline)?;
    }
    rec.insert("kline".to_owned(), Value::Object(kline));
    Ok(rec)
}

fn book_ticker(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "bookTicker";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("bookTicker"));
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
            FieldSpec::opt("pair", "ps"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn index_price_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    envelope::broadcast(
        "indexPriceUpdate",
        env,
        "!indexPrice@arr",
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("pair", "i"),
            FieldSpec::req("index_price", "p"),
        ],
    )
}

fn mark_price_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    envelope::broadcast(
        "markPriceUpdate",
        env,
        "!markPrice@arr",
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("mark_price", "p"),
            FieldSpec::req("estimated_settle_price", "P"),
            FieldSpec::req("funding_rate", "r"),
            FieldSpec::req("next_funding_time", "T"),
            FieldSpec::opt("index_price", "i"),
        ],
    )
}

/// Liquidation order.
fn force_order(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "forceOrder";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("forceOrder"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
        ],
        &mut rec,
    )?;
    let order = fields::object(KIND, env.data, "o")?;
    fields::apply(
        KIND,
        order,
        &[
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("side", "S"),
            FieldSpec::req("order_type", "o"),
            FieldSpec::req("time_in_force", "f"),
            FieldSpec::req("original_quantity", "q"),
            FieldSpec::req("price", "p"),
            FieldSpec::req("avg_price", "ap"),
            FieldSpec::req("order_status", "X"),
            FieldSpec::req("last_executed_quantity", "l"),
            FieldSpec::req("cumulative_filled_quantity", "z"),
            FieldSpec::req("transaction_time", "T"),
            FieldSpec::opt("pair", "ps"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn composite_index(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "compositeIndex";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("compositeIndex"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("price", "p"),
        ],
        &mut rec,
    )?;
    let composition = fields::map_list(
        KIND,
        env.data,
        "c",
        &[
            FieldSpec::req("base_asset", "b"),
            FieldSpec::req("quote_asset", "q"),
            FieldSpec::req("weight_quantity", "w"),
            FieldSpec::req("weight_percentage", "W"),
            FieldSpec::req("index_price", "i"),
        ],
    )?;
    rec.insert("composition".to_owned(), Value::Array(composition));
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
            FieldSpec::req("total_traded_base_asset_volume", "v"),
            FieldSpec::req("total_traded_quote_asset_volume", "q"),
            FieldSpec::opt("pair", "ps"),
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
            FieldSpec::req("last_price", "c"),
            FieldSpec::req("last_quantity", "Q"),
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
            FieldSpec::opt("pair", "ps"),
        ],
    )
}

/// Futures depth diff. `pu` (final update id of the previous event) is what
/// distinguishes this from the spot variant; `depth_level` only exists for
/// partial streams and defaults to `false` otherwise.
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
            FieldSpec::req("transaction_time", "T"),
            FieldSpec::req("symbol", "s"),
            FieldSpec::or_false("depth_level", "depth_level"),
            FieldSpec::req("first_update_id_in_event", "U"),
            FieldSpec::req("final_update_id_in_event", "u"),
            FieldSpec::req("final_update_id_in_previous_event", "pu"),
            FieldSpec::req("asks", "a"),
            FieldSpec::req("bids", "b"),
            FieldSpec::opt("pair", "ps"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn order_trade_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "ORDER_TRADE_UPDATE";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("ORDER_TRADE_UPDATE"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::opt("account_alias", "i"),
        ],
        &mut rec,
    )?;
    let order = fields::object(KIND, env.data, "o")?;
    fields::apply(
        KIND,
        order,
        &[
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("client_order_id", "c"),
            FieldSpec::req("side", "S"),
            FieldSpec::req("order_type", "o"),
            FieldSpec::req("time_in_force", "f"),
            FieldSpec::req("order_quantity", "q"),
            FieldSpec::req("order_price", "p"),
            FieldSpec::req("order_avg_price", "ap"),
            FieldSpec::req("order_stop_price", "sp"),
            FieldSpec::req("current_execution_type", "x"),
            FieldSpec::req("current_order_status", "X"),
            FieldSpec::req("order_id", "i"),
            FieldSpec::req("last_executed_quantity", "l"),
            FieldSpec::req("cumulative_filled_quantity", "z"),
            FieldSpec::req("last_executed_price", "L"),
            FieldSpec::req("transaction_time", "T"),
            FieldSpec::req("trade_id", "t"),
            FieldSpec::req("net_pay", "b"),
            FieldSpec::req("net_selling_order_value", "a"),
            FieldSpec::req("is_trade_maker_side", "m"),
            FieldSpec::req("reduce_only", "R"),
            FieldSpec::req("trigger_price_type", "wt"),
            FieldSpec::req("order_price_type", "ot"),
            FieldSpec::req("position_side", "ps"),
            FieldSpec::req("order_realized_profit", "rp"),
            // Pushed only when applicable (commission, margin, trailing
            // stops, close-all conditional orders).
            FieldSpec::opt("margin_asset", "ma"),
            FieldSpec::opt("commission_asset", "N"),
            FieldSpec::opt("commission", "n"),
            FieldSpec::opt("close_all", "cp"),
            FieldSpec::opt("activation_price", "AP"),
            FieldSpec::opt("callback_rate", "cr"),
        ],
        &mut rec,
    )?;
    Ok(rec)
}

fn account_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "ACCOUNT_UPDATE";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("ACCOUNT_UPDATE"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::req("transaction", "T"),
            FieldSpec::opt("account_alias", "i"),
        ],
        &mut rec,
    )?;
    let update = fields::object(KIND, env.data, "a")?;
    fields::apply(
        KIND,
        update,
        &[FieldSpec::req("event_reason", "m")],
        &mut rec,
    )?;
    let balances = fields::map_list(
        KIND,
        update,
        "B",
        &[
            FieldSpec::req("asset", "a"),
            FieldSpec::req("wallet_balance", "wb"),
            FieldSpec::req("cross_wallet_balance", "cw"),
            FieldSpec::opt("balance_change", "bc"),
        ],
    )?;
    rec.insert("balances".to_owned(), Value::Array(balances));
    let positions = fields::map_list(
        KIND,
        update,
        "P",
        &[
            FieldSpec::req("symbol", "s"),
            FieldSpec::req("position_amount", "pa"),
            FieldSpec::req("entry_price", "ep"),
            FieldSpec::req("accumulated_realized", "cr"),
            FieldSpec::req("upnl", "up"),
            FieldSpec::req("margin_type", "mt"),
            FieldSpec::req("isolated_wallet", "iw"),
            FieldSpec::req("position_side", "ps"),
        ],
    )?;
    rec.insert("positions".to_owned(), Value::Array(positions));
    Ok(rec)
}

fn margin_call(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "MARGIN_CALL";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("MARGIN_CALL"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
            FieldSpec::opt("account_alias", "i"),
            // Only pushed with crossed-position margin calls.
            FieldSpec::opt("cross_wallet", "cw"),
        ],
        &mut rec,
    )?;
    let mut positions = Vec::new();
    for position in fields::array(KIND, env.data, "p")? {
        let obj = position
            .as_object()
            .ok_or(NormalizeError::MissingField { kind: KIND, field: "p" })?;
        let mut mapped = Map::new();
        fields::apply(
            KIND,
            obj,
            &[
                FieldSpec::req("symbol", "s"),
                FieldSpec::req("side", "ps"),
                FieldSpec::req("amount", "pa"),
                FieldSpec::req("type", "mt"),
                FieldSpec::req("price", "mp"),
                FieldSpec::req("pnl", "up"),
                FieldSpec::req("margin", "mm"),
            ],
            &mut mapped,
        )?;
        // Isolated-wallet balance is reported at the record level, matching
        // the established output schema.
        fields::apply(
            KIND,
            obj,
            &[FieldSpec::opt("isolated_wallet", "iw")],
            &mut rec,
        )?;
        positions.push(Value::Object(mapped));
    }
    rec.insert("positions".to_owned(), Value::Array(positions));
    Ok(rec)
}

/// Leverage change (`ac`) or multi-assets mode change (`ai`).
fn account_config_update(env: &Envelope<'_>) -> Result<Map<String, Value>, NormalizeError> {
    const KIND: &str = "ACCOUNT_CONFIG_UPDATE";
    let mut rec = Map::new();
    rec.insert("stream_type".to_owned(), json!("ACCOUNT_CONFIG_UPDATE"));
    fields::apply(
        KIND,
        env.data,
        &[
            FieldSpec::req("event_type", "e"),
            FieldSpec::req("event_time", "E"),
        ],
        &mut rec,
    )?;
    if env.data.contains_key("ac") {
        let config = fields::object(KIND, env.data, "ac")?;
        fields::apply(
            KIND,
            config,
            &[
                FieldSpec::req("symbol", "s"),
                FieldSpec::req("leverage", "l"),
            ],
            &mut rec,
        )?;
    } else {
        let config = fields::object(KIND, env.data, "ai")?;
        fields::apply(
            KIND,
            config,
            &[FieldSpec::req("multi_assets_mode", "j")],
            &mut rec,
        )?;
    }
    Ok(rec)
}
