use num_format::{Locale, ToFormattedString};

/// Maximum fraction digits `format_number` keeps, as browsers do for pt-BR.
const NUMBER_FRACTION_DIGITS: u32 = 3;

/// `1234.5` -> `1.234,5`
pub fn format_number(value: f64) -> String {
    let value = finite_or_zero(value);
    let (negative, integer, fraction) = split(value, NUMBER_FRACTION_DIGITS);

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&integer.to_formatted_string(&Locale::pt));

    if fraction > 0 {
        let digits = format!("{fraction:0width$}", width = NUMBER_FRACTION_DIGITS as usize);
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// `1234.56` -> `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    let value = finite_or_zero(value);
    let (negative, integer, cents) = split(value, 2);
    let sign = if negative { "-" } else { "" };
    format!(
        "{sign}R$ {},{cents:02}",
        integer.to_formatted_string(&Locale::pt)
    )
}

/// One decimal with a dot, matching the legend and KPI texts: `66.7%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", finite_or_zero(value))
}

/// Thousands of reais with at most one decimal: `1234.0` -> `R$ 1,2 Mil`.
pub fn format_currency_mil(value: f64) -> String {
    let thousands = finite_or_zero(value) / 1000.0;
    let (negative, integer, tenths) = split(thousands, 1);
    let sign = if negative { "-" } else { "" };
    let integer = integer.to_formatted_string(&Locale::pt);

    if tenths == 0 {
        format!("{sign}R$ {integer} Mil")
    } else {
        format!("{sign}R$ {integer},{tenths} Mil")
    }
}

pub fn format_days(value: f64) -> String {
    format!("{:.1} dias", finite_or_zero(value))
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sign, integer part and `digits` rounded fraction digits of `value`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split(value: f64, digits: u32) -> (bool, u64, u64) {
    let scale = 10_u64.pow(digits);
    let scaled = (value.abs() * scale as f64).round() as u64;
    let negative = value < 0.0 && scaled != 0;
    (negative, scaled / scale, scaled % scale)
}
