//! Fixtures for tests

use crate::investor::InvestorType;
use crate::pool::TokenPool;
use crate::simulation::SimulationRequest;
use crate::units::Tokens;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that a simulation is rejected with the given message
macro_rules! assert_sim_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_sim_error;

/// A modest purchase by a Philippine investor from a full-size pool
#[fixture]
pub fn request() -> SimulationRequest {
    SimulationRequest::new(Tokens(1000.0), Tokens(248_400.0), InvestorType::Philippine)
}

/// A pool with some sales recorded
#[fixture]
pub fn pool() -> TokenPool {
    TokenPool {
        total_tokens: Tokens(248_400.0),
        sold_foreign: Tokens(10_000.0),
        sold_philippine: Tokens(20_000.0),
    }
}
