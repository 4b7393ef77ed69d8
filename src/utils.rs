// Utility functions
use chrono::{DateTime, Duration, Utc};

/// Текущее время в миллисекундах Unix.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Преобразует миллисекунды Unix в `DateTime<Utc>`, если возможно.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Истёк ли срок жизни записи с отметкой `timestamp_ms`.
pub fn is_expired(timestamp_ms: i64, ttl: Duration, now_ms: i64) -> bool {
    now_ms - timestamp_ms > ttl.num_milliseconds()
}

/// Форматирует цену как в ru-RU: `1 234 567 ₽`, без цены выводится `—`.
pub fn fmt_price(price: Option<f64>) -> String {
    let Some(price) = price.filter(|p| p.is_finite()) else {
        return "—".to_string();
    };

    let negative = price < 0.0;
    let rounded = (price.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\u{a0}');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if cents > 0 {
        let frac = format!("{cents:02}");
        out.push(',');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push_str(" ₽");
    out
}
