use serde::{Deserialize, Serialize};

/// One aggregated flight offer produced by a simulated source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightResult {
    pub source: String,
    pub airline: String,
    pub flight_number: String,
    pub departure_time: String,
    pub price: i64,
    pub from: String,
    pub to: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub trip_type: String,
    pub pax: u32,
    pub timestamp: String,
    pub seat_class: String,
    pub affiliate_link: String,
    pub booking_url: String,
    pub is_common: bool,
}

/// Everything that travels over the result channel for one search.
///
/// The tag doubles as the wire `type` field, so transports can match on the
/// variant instead of probing payloads for optional keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultEvent {
    Result(FlightResult),
    Cancelled,
    Completed { total_flights: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_wire_shape() {
        let json = serde_json::to_string(&ResultEvent::Cancelled).expect("serialize");
        assert_eq!(json, r#"{"type":"cancelled"}"#);

        let parsed: ResultEvent = serde_json::from_str(&json).expect("deserialize");
        assert!(matches!(parsed, ResultEvent::Cancelled));
    }

    #[test]
    fn test_completed_carries_total() {
        let json = serde_json::to_string(&ResultEvent::Completed { total_flights: 24 }).unwrap();
        let parsed: ResultEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            ResultEvent::Completed { total_flights } => assert_eq!(total_flights, 24),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_result_round_trips_with_type_tag() {
        let flight = FlightResult {
            source: "kiwi".into(),
            airline: "AirAsia".into(),
            flight_number: "AK123".into(),
            departure_time: "10:15".into(),
            price: 750_000,
            from: "CGK".into(),
            to: "DPS".into(),
            departure_date: "2026-09-01".into(),
            return_date: None,
            trip_type: "one_way".into(),
            pax: 1,
            timestamp: "2026-08-07 10:00:00".into(),
            seat_class: "Economy".into(),
            affiliate_link: "https://kiwi.com/affiliate".into(),
            booking_url: "https://kiwi.com/flights".into(),
            is_common: true,
        };

        let json = serde_json::to_string(&ResultEvent::Result(flight)).unwrap();
        assert!(json.contains(r#""type":"result""#));
        assert!(json.contains(r#""airline":"AirAsia""#));

        let parsed: ResultEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            ResultEvent::Result(f) => assert_eq!(f.flight_number, "AK123"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
