use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer};

/// تابعی برای دی‌سریال‌سازی که در صورت بروز خطا، مقدار پیش‌فرض را برمی‌گرداند
pub fn ok_or_default<'a, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'a> + Default,
    D: Deserializer<'a>,
{
    let v: serde_json::Value = Deserialize::deserialize(deserializer)?;
    Ok(T::deserialize(v).unwrap_or_default())
}

/// اختصار اعداد بزرگ (مثلاً 1.5m برای یک میلیون و پانصد هزار)
pub fn abbr_large_numbers(value: f64) -> String {
    let abs_value = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    match abs_value {
        v if v >= 1_000_000_000.0 => format!("{}{:.2}b", sign, v / 1_000_000_000.0),
        v if v >= 1_000_000.0 => format!("{}{:.2}m", sign, v / 1_000_000.0),
        v if v >= 10_000.0 => format!("{}{:.1}k", sign, v / 1_000.0),
        v if v >= 1_000.0 => format!("{}{:.2}k", sign, v / 1_000.0),
        v if v >= 100.0 => format!("{}{:.0}", sign, v),
        v if v >= 10.0 => format!("{}{:.1}", sign, v),
        v if v >= 1.0 => format!("{}{:.2}", sign, v),
        v if v == 0.0 => "0".to_string(),
        v => {
            let s = format!("{}{:.4}", sign, v);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}

/// تعداد ارقام اعشار مناسب برای نمایش قیمت‌ها با گام داده شده
pub fn decimals_for_step(step: f64) -> usize {
    if !(step.is_finite() && step > 0.0) || step >= 1.0 {
        return 0;
    }
    (-step.log10() - 1e-9).ceil().clamp(0.0, 8.0) as usize
}

/// قیمت با تعداد اعشار مشخص و جداکننده هزارگان
pub fn format_price(price: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, price.abs());
    let (integer_part, decimal_part) = match formatted.find('.') {
        Some(pos) => formatted.split_at(pos),
        None => (formatted.as_str(), ""),
    };

    let mut result = String::with_capacity(formatted.len() + integer_part.len() / 3 + 1);
    if price < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        result.push('-');
    }

    let digits_len = integer_part.len();
    for (i, ch) in integer_part.chars().enumerate() {
        result.push(ch);

        let pos_from_right = digits_len - i - 1;
        if i < digits_len - 1 && pos_from_right % 3 == 0 {
            result.push(',');
        }
    }
    result.push_str(decimal_part);

    result
}

/// گام «گرد» برای خطوط شبکه: ۱، ۲ یا ۵ ضرب در توانی از ده
pub fn nice_step(range: f64, max_lines: usize) -> f64 {
    if !(range.is_finite() && range > 0.0) || max_lines == 0 {
        return 1.0;
    }

    let raw = range / max_lines as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;

    let nice = match normalized {
        n if n <= 1.0 => 1.0,
        n if n <= 2.0 => 2.0,
        n if n <= 5.0 => 5.0,
        _ => 10.0,
    };
    nice * magnitude
}

/// گرد کردن قیمت به گام بعدی (بالا یا پایین)
pub fn round_to_next_step(value: f64, step: f64, down: bool) -> f64 {
    if down {
        (value / step).floor() * step
    } else {
        (value / step).ceil() * step
    }
}

/// فرمت‌بندی درصد تغییرات (با علامت + برای مقادیر مثبت)
pub fn pct_change(change: f64) -> String {
    match change {
        c if c > 0.0 => format!("+{:.2}%", c),
        _ => format!("{:.2}%", change),
    }
}

/// نگهداری آخرین مقدار تا زمانی که به مدت مشخص تغییری رخ ندهد
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// ثبت مقدار جدید؛ مهلت از نو شروع می‌شود
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// اگر مهلت گذشته باشد مقدار نهایی را برمی‌گرداند
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.delay);

        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}
