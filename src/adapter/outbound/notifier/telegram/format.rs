//! HTML message layout for Telegram.

use crate::domain::Record;
use crate::infrastructure::config::translation::TranslationMode;

use super::super::format::{cap, escape_html, publish_time, truncate};

/// Telegram rejects messages over 4096 characters.
const MESSAGE_LIMIT: usize = 4090;

const SOURCE_URL: &str = "https://www.binance.com/en/support/announcement";

const BOTH_BODY_CHARS: usize = 800;
const TRANSLATED_BODY_CHARS: usize = 1200;
const ORIGINAL_BODY_CHARS: usize = 1000;

/// Render a record for the configured translation mode.
///
/// Translation modes only apply when the record actually carries a
/// translation; otherwise the original layout is used.
pub fn format_record(record: &Record, mode: TranslationMode) -> String {
    let message = match mode {
        TranslationMode::Translated if record.has_translation() => translated(record),
        TranslationMode::Both if record.has_translation() => both(record),
        _ => original(record),
    };
    cap(message, MESSAGE_LIMIT)
}

fn original(record: &Record) -> String {
    let mut msg = String::from("🔔 <b>币安公告</b>\n\n");
    msg.push_str(&format!("<b>{}</b>\n\n", escape_html(&record.title)));
    if !record.body.is_empty() {
        msg.push_str(&escape_html(&truncate(&record.body, ORIGINAL_BODY_CHARS)));
    }
    if let Some(disclaimer) = record.disclaimer.as_deref().filter(|d| !d.is_empty()) {
        msg.push_str(&format!("\n\n<i>{}</i>", escape_html(disclaimer)));
    }
    msg.push_str(&format!(
        "\n\n📅 发布时间: {}",
        publish_time(record.publish_date)
    ));
    msg
}

fn translated(record: &Record) -> String {
    let title = record.translated_title.as_deref().unwrap_or(&record.title);
    let body = record.translated_body.as_deref().unwrap_or(&record.body);

    let mut msg = String::from("🚨 <b>币安官方公告</b>\n\n");
    msg.push_str(&quote(title, body, TRANSLATED_BODY_CHARS));
    footer(&mut msg, record);
    msg
}

fn both(record: &Record) -> String {
    let mut msg = String::from("🚨 <b>币安官方公告</b>\n\n");

    msg.push_str("🇨🇳 <b>中文</b>\n");
    msg.push_str(&quote(
        record.translated_title.as_deref().unwrap_or_default(),
        record.translated_body.as_deref().unwrap_or_default(),
        BOTH_BODY_CHARS,
    ));

    msg.push_str("🇬🇧 <b>原文</b>\n");
    msg.push_str(&quote(&record.title, &record.body, BOTH_BODY_CHARS));

    footer(&mut msg, record);
    msg
}

fn quote(title: &str, body: &str, body_chars: usize) -> String {
    let mut block = String::from("<blockquote>\n");
    if !title.is_empty() {
        block.push_str(&format!("<b>{}</b>\n\n", escape_html(title)));
    }
    if !body.is_empty() {
        block.push_str(&format!("{}\n", escape_html(&truncate(body, body_chars))));
    }
    block.push_str("</blockquote>\n\n");
    block
}

fn footer(msg: &mut String, record: &Record) {
    if !record.catalog_name.is_empty() {
        msg.push_str(&format!(
            "📂 <b>分类:</b> <code>{}</code>\n",
            escape_html(&record.catalog_name)
        ));
    }
    msg.push_str(&format!(
        "🕐 <b>发布时间:</b> <code>{}</code>\n",
        publish_time(record.publish_date)
    ));
    msg.push_str(&format!(
        "\n<b>消息来源:</b> <a href=\"{SOURCE_URL}\">币安官方</a>"
    ));
}
