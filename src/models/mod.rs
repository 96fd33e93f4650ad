pub mod appointment;
pub mod context;
pub mod intent;

pub use appointment::{
    AppointmentField, AppointmentRecord, PendingAppointment, EMAIL_NOT_PROVIDED, INSURANCE_TYPES,
};
pub use context::{ConversationContext, ConversationState, TurnRecord};
pub use intent::Intent;
