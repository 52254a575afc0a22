mod block_strategy;
pub use block_strategy::{BlockStrategy, UnknownStrategy};

mod execute_result;
pub use execute_result::ExecuteResult;

mod run_request;
pub use run_request::{JobId, RunRequest};
