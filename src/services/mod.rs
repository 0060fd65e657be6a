pub mod verification;

pub use verification::{
    RunError, RunState, Step, StepOutcome, StepReport, VerificationError, VerificationPlan,
    VerificationReport, VerificationRunner, TEST_PAYLOAD,
};
