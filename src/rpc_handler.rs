//! RPC method handler for the Smartmark JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be tested without stdio.
//! `handle_method` maps one method call onto the [`App`].

use serde::Serialize;
use serde_json::{json, Value};

use crate::app::App;
use crate::types::session::{AuthCallback, Identity};

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("serialization error: {}", e))
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn opt_str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn callback_from_params(params: &Value) -> Result<AuthCallback, String> {
    if let Some(token) = opt_str_param(params, "access_token") {
        return Ok(AuthCallback::Token {
            access_token: token.to_string(),
        });
    }
    if let Some(identity) = params.get("identity") {
        let identity: Identity = serde_json::from_value(identity.clone())
            .map_err(|e| format!("invalid identity: {}", e))?;
        return Ok(AuthCallback::Identity(identity));
    }
    Err("missing access_token or identity".to_string())
}

fn visible(app: &App) -> Value {
    json!({
        "query": app.query(),
        "bookmarks": app.visible_bookmarks(),
    })
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Session ───
        "session.get" => Ok(json!({
            "session": app.session(),
            "theme": app.theme(),
        })),
        "session.resolve" => {
            let session = app.resolve_session().await.map_err(|e| e.to_string())?;
            to_json(&session)
        }
        "session.sign_in" => {
            let provider = opt_str_param(params, "provider");
            let flow = app.sign_in(provider).await.map_err(|e| e.to_string())?;
            to_json(&flow)
        }
        "session.callback" => {
            let callback = callback_from_params(params)?;
            let session = app
                .complete_sign_in(callback)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&session)
        }
        "session.sign_out" => {
            app.sign_out().await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Bookmarks ───
        "bookmark.refresh" => {
            let outcome = app.refresh().await.map_err(|e| e.to_string())?;
            to_json(&outcome)
        }
        "bookmark.list" => Ok(visible(app)),
        "bookmark.search" => {
            let query = str_param(params, "query")?;
            app.set_query(query);
            Ok(visible(app))
        }
        "bookmark.add" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let outcome = app.add_bookmark(title, url).await.map_err(|e| e.to_string())?;
            to_json(&outcome)
        }
        "bookmark.draft" => {
            if let Some(title) = opt_str_param(params, "title") {
                app.set_draft_title(title);
            }
            if let Some(url) = opt_str_param(params, "url") {
                app.set_draft_url(url);
            }
            to_json(&app.draft())
        }
        "bookmark.submit" => {
            let outcome = app.submit_draft().await.map_err(|e| e.to_string())?;
            to_json(&outcome)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let confirmed = params
                .get("confirmed")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let outcome = app
                .delete_bookmark(id, confirmed)
                .await
                .map_err(|e| e.to_string())?;
            to_json(&outcome)
        }

        // ─── Notices & theme ───
        "notice.list" => to_json(&app.notices()),
        "notice.dismiss" => {
            let id = params
                .get("id")
                .and_then(|v| v.as_u64())
                .ok_or("missing id")?;
            Ok(json!({"dismissed": app.dismiss_notice(id)}))
        }
        "theme.toggle" => Ok(json!({"theme": app.toggle_theme()})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
