//! Simulated upstream sources.
//!
//! Each source draws flights from a small per-source catalog. A slice of the
//! output is shared "common" inventory that several sources offer at slightly
//! different prices; the rest is synthetic.

use chrono::Utc;
use rand::Rng;
use skyfare_shared::{FlightResult, SearchRequest};

pub const SOURCES: [&str; 3] = ["kiwi", "trip", "12go"];

/// Flight times from morning to night.
pub const DEPARTURE_TIMES: [&str; 9] = [
    "06:00", "08:30", "10:15", "12:00", "14:30", "16:45", "18:20", "20:00", "22:30",
];

pub const SEAT_CLASSES: [&str; 3] = ["Economy", "Business", "Premium Economy"];

/// Chance that a source offers a catalog flight instead of a synthetic one.
pub const COMMON_FLIGHT_PROBABILITY: f64 = 0.3;

/// Lowest price a common flight can be jittered down to, in IDR.
pub const MIN_PRICE: i64 = 500_000;

/// Price jitter applied to common flights across sources, in IDR.
pub const COMMON_PRICE_JITTER: i64 = 50_000;

#[derive(Debug, Clone, Copy)]
pub struct CommonFlight {
    pub airline: &'static str,
    pub flight_number: &'static str,
    pub departure_time: &'static str,
    pub base_price: i64,
}

/// Flights that multiple sources might offer.
pub const COMMON_FLIGHTS: [CommonFlight; 3] = [
    CommonFlight {
        airline: "AirAsia",
        flight_number: "AK123",
        departure_time: "10:15",
        base_price: 750_000,
    },
    CommonFlight {
        airline: "Garuda",
        flight_number: "GA456",
        departure_time: "14:30",
        base_price: 1_200_000,
    },
    CommonFlight {
        airline: "Lion Air",
        flight_number: "JT789",
        departure_time: "08:30",
        base_price: 650_000,
    },
];

pub fn airlines_for(source: &str) -> &'static [&'static str] {
    match source {
        "kiwi" => &["Lion Air", "Garuda", "AirAsia", "Batik Air", "Citilink"],
        "trip" => &[
            "Singapore Airlines",
            "Malaysia Airlines",
            "Thai Airways",
            "Vietnam Airlines",
            "Philippine Airlines",
        ],
        "12go" => &["Cebu Pacific", "Jetstar", "Tiger Air", "Scoot", "AirAsia"],
        _ => &["Garuda"],
    }
}

/// Generate the `seq`-th flight for a source. The first few slots may yield
/// common catalog flights; everything else is synthetic.
pub fn generate_flight<R: Rng>(
    rng: &mut R,
    source: &str,
    request: &SearchRequest,
    seq: usize,
) -> FlightResult {
    if seq < COMMON_FLIGHTS.len() && rng.gen_bool(COMMON_FLIGHT_PROBABILITY) {
        common_flight(rng, source, request, &COMMON_FLIGHTS[seq])
    } else {
        synthetic_flight(rng, source, request)
    }
}

fn common_flight<R: Rng>(
    rng: &mut R,
    source: &str,
    request: &SearchRequest,
    catalog: &CommonFlight,
) -> FlightResult {
    // Same flight, slightly different price per source.
    let jitter = rng.gen_range(-COMMON_PRICE_JITTER..COMMON_PRICE_JITTER);
    let price = (catalog.base_price + jitter).max(MIN_PRICE);
    let total_price = price * request.pax as i64;

    build_result(
        rng,
        source,
        request,
        catalog.airline.to_string(),
        catalog.flight_number.to_string(),
        catalog.departure_time.to_string(),
        total_price,
        true,
    )
}

fn synthetic_flight<R: Rng>(rng: &mut R, source: &str, request: &SearchRequest) -> FlightResult {
    let departure_time = DEPARTURE_TIMES[rng.gen_range(0..DEPARTURE_TIMES.len())];
    let airlines = airlines_for(source);
    let airline = airlines[rng.gen_range(0..airlines.len())];
    let base_price: i64 = MIN_PRICE + rng.gen_range(0..2_000_000);
    let prefix: String = source.chars().take(2).collect::<String>().to_uppercase();
    let flight_number = format!("{}{}", prefix, rng.gen_range(100..1000));
    let total_price = base_price * request.pax as i64;

    build_result(
        rng,
        source,
        request,
        airline.to_string(),
        flight_number,
        departure_time.to_string(),
        total_price,
        false,
    )
}

#[allow(clippy::too_many_arguments)]
fn build_result<R: Rng>(
    rng: &mut R,
    source: &str,
    request: &SearchRequest,
    airline: String,
    flight_number: String,
    departure_time: String,
    price: i64,
    is_common: bool,
) -> FlightResult {
    let affiliate_link = affiliate_link(source, request, &flight_number, price);
    let booking_url = booking_url(source, request, &flight_number);

    FlightResult {
        source: source.to_string(),
        airline,
        flight_number,
        departure_time,
        price,
        from: request.origin.clone(),
        to: request.destination.clone(),
        departure_date: request.departure_date.clone(),
        return_date: request.return_date.clone(),
        trip_type: request.trip_type.clone(),
        pax: request.pax,
        timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        seat_class: SEAT_CLASSES[rng.gen_range(0..SEAT_CLASSES.len())].to_string(),
        affiliate_link,
        booking_url,
        is_common,
    }
}

fn affiliate_link(source: &str, request: &SearchRequest, flight_number: &str, price: i64) -> String {
    format!(
        "https://{}.com/affiliate?source=flight_search&from={}&to={}&flight={}&price={}&pax={}&ref=skyfare",
        source, request.origin, request.destination, flight_number, price, request.pax
    )
}

fn booking_url(source: &str, request: &SearchRequest, flight_number: &str) -> String {
    format!(
        "https://{}.com/flights/{}-{}/{}?departure_date={}&pax={}",
        source,
        request.origin,
        request.destination,
        flight_number,
        request.departure_date,
        request.pax
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request(pax: u32) -> SearchRequest {
        SearchRequest {
            origin: "CGK".into(),
            destination: "SIN".into(),
            trip_type: "round_trip".into(),
            departure_date: "2026-09-01".into(),
            return_date: Some("2026-09-08".into()),
            pax,
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let req = request(1);
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        for seq in 0..10 {
            let x = generate_flight(&mut a, "kiwi", &req, seq);
            let y = generate_flight(&mut b, "kiwi", &req, seq);
            assert_eq!(x.flight_number, y.flight_number);
            assert_eq!(x.price, y.price);
            assert_eq!(x.is_common, y.is_common);
        }
    }

    #[test]
    fn test_common_price_respects_floor_and_pax() {
        let req = request(2);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let flight = common_flight(&mut rng, "trip", &req, &COMMON_FLIGHTS[2]);
            // Floor applies before the pax multiplier.
            assert!(flight.price >= MIN_PRICE * 2, "price {}", flight.price);
            assert_eq!(flight.price % 2, 0);
            assert!(flight.is_common);
            assert_eq!(flight.flight_number, "JT789");
        }
    }

    #[test]
    fn test_synthetic_flight_uses_source_catalog() {
        let req = request(1);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let flight = synthetic_flight(&mut rng, "12go", &req);
            assert!(airlines_for("12go").contains(&flight.airline.as_str()));
            assert!(flight.flight_number.starts_with("12"));
            assert!(DEPARTURE_TIMES.contains(&flight.departure_time.as_str()));
            assert!(flight.price >= MIN_PRICE);
            assert!(!flight.is_common);
        }
    }

    #[test]
    fn test_links_derive_from_request_fields() {
        let req = request(3);
        let mut rng = StdRng::seed_from_u64(11);
        let flight = generate_flight(&mut rng, "kiwi", &req, 5);

        assert!(flight.affiliate_link.starts_with("https://kiwi.com/affiliate?"));
        assert!(flight.affiliate_link.contains("from=CGK"));
        assert!(flight.affiliate_link.contains("pax=3"));
        assert!(flight
            .booking_url
            .contains(&format!("flights/CGK-SIN/{}", flight.flight_number)));
    }
}
