use std::time::Duration;

/// Elements that enter with an animation.
pub const ANIMATABLE_SELECTOR: &str = "[data-animate=\"step\"]";

/// Visible fraction at which a scrolled-in element starts its entrance.
pub const ANIMATION_THRESHOLD: f64 = 0.1;

/// Chart canvases and map containers.
pub const CONTAINER_SELECTOR: &str = ".chart-container, .map-container";

/// Reads a `data-delay` attribute the way `parseInt` does: leading digits
/// count, anything else (or nothing) is no delay.
pub fn parse_delay(attribute: Option<&str>) -> Duration {
    let Some(raw) = attribute else {
        return Duration::ZERO;
    };
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<u64>() {
        Ok(millis) if !negative => Duration::from_millis(millis),
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_milliseconds() {
        assert_eq!(parse_delay(Some("300")), Duration::from_millis(300));
        assert_eq!(parse_delay(Some(" 120")), Duration::from_millis(120));
    }

    #[test]
    fn trailing_units_are_ignored() {
        assert_eq!(parse_delay(Some("450ms")), Duration::from_millis(450));
        assert_eq!(parse_delay(Some("12.7")), Duration::from_millis(12));
    }

    #[test]
    fn garbage_and_missing_mean_no_delay() {
        assert_eq!(parse_delay(None), Duration::ZERO);
        assert_eq!(parse_delay(Some("")), Duration::ZERO);
        assert_eq!(parse_delay(Some("soon")), Duration::ZERO);
    }

    #[test]
    fn negative_delay_fires_immediately() {
        assert_eq!(parse_delay(Some("-200")), Duration::ZERO);
    }
}
