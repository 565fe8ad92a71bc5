use std::sync::Arc;

use crate::cqrs::ProcessMpesaCallbackCommandHandler;

#[derive(Clone)]
pub struct AppState {
    pub process_callback_handler: Arc<ProcessMpesaCallbackCommandHandler>,
}
