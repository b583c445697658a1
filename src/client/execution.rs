//! 请求执行管线：可用性检查、模拟拦截、传输调用、响应规范化与事件通知。
//!
//! Request execution pipeline.
//!
//! Every path returns an [`ApiResponse`]; failures are folded into 500
//! responses carrying a descriptive message.

use tracing::{debug, debug_span, info};
use uuid::Uuid;

use super::core::ApiClient;
use crate::telemetry::{EventKind, EventType, ListenerType};
use crate::transport::TransportResult;
use crate::types::{ApiRequest, ApiResponse, CallParams, STATUS_INTERNAL_ERROR};
use crate::Error;

const SENDING_FAILED: &str = "Error while sending request";
const BUILDING_FAILED: &str = "Error while building request";
const NOT_OPERATIONAL: &str = "API is not operational, check parameters and initialization state.";
const NOT_ENABLED: &str = "API is not enabled.";
const NOT_WELL_FORMED: &str = "Request is not well formed";
const ASYNC_NOT_IMPLEMENTED: &str = "Asynchronous execution is not implemented";

impl ApiClient {
    /// Build a request of the client's default type from `params` and
    /// dispatch it.
    pub fn request(&self, params: CallParams) -> ApiResponse {
        if let Err(rejected) = self.ensure_operable(SENDING_FAILED) {
            return rejected;
        }

        self.hooks.pre_build_request(&params);

        let method = params.method.to_ascii_uppercase();
        let endpoint = params.endpoint.clone();
        let is_async = params.is_async;

        match self
            .request_factory
            .create(&self.request_type, &self.request_args, params)
        {
            Some(request) if is_async => self.do_request_async(request),
            Some(request) => self.do_request(request),
            None => self.response_factory.create(
                STATUS_INTERNAL_ERROR,
                BUILDING_FAILED,
                &format!("Unable to build {} request for endpoint \"{}\"", method, endpoint),
                None,
                None,
            ),
        }
    }

    /// Dispatch a pre-built request according to its own async flag.
    pub fn execute_request(&self, request: Option<Box<dyn ApiRequest>>) -> ApiResponse {
        if let Err(rejected) = self.ensure_operable(BUILDING_FAILED) {
            return rejected;
        }

        match request {
            Some(request) if request.is_async() => self.do_request_async(request),
            Some(request) => self.do_request(request),
            None => self.response_factory.create(
                STATUS_INTERNAL_ERROR,
                SENDING_FAILED,
                NOT_WELL_FORMED,
                None,
                None,
            ),
        }
    }

    /// Operability error as it would be reported, if any.
    pub fn operability_error(&self) -> Option<Error> {
        if !self.operational {
            Some(Error::Operability(NOT_OPERATIONAL.to_string()))
        } else if !self.enabled {
            Some(Error::Operability(NOT_ENABLED.to_string()))
        } else {
            None
        }
    }

    fn ensure_operable(&self, not_operational_reason: &str) -> Result<(), ApiResponse> {
        let reason = if self.operational {
            SENDING_FAILED
        } else {
            not_operational_reason
        };
        match self.operability_error() {
            None => Ok(()),
            Some(err) => {
                debug!(error = %err, "request rejected");
                let message = match err {
                    Error::Operability(message) => message,
                    other => other.to_string(),
                };
                Err(self
                    .response_factory
                    .create(STATUS_INTERNAL_ERROR, reason, &message, None, None))
            }
        }
    }

    fn do_request(&self, mut request: Box<dyn ApiRequest>) -> ApiResponse {
        // Prebuilt requests skip the factory, so normalize the verb here too.
        let method = request.method().to_ascii_uppercase();
        request.params_mut().method = method;

        let span = debug_span!(
            "api_call",
            request_id = %Uuid::new_v4(),
            method = request.method(),
            endpoint = request.endpoint(),
        );
        let _guard = span.enter();

        self.notify(EventType::PreExecute, request.as_ref(), None);
        self.trigger_listener(ListenerType::PreExecute, request.as_mut());

        let outcome = match self.find_mock(request.as_ref()) {
            Some(outcome) => outcome,
            None => self.transport.execute(request.as_ref()),
        };

        let custom_data = request.custom_data().cloned();
        let response = if !outcome.error {
            let status = if outcome.status == 0 {
                STATUS_INTERNAL_ERROR
            } else {
                outcome.status
            };
            let response = self
                .response_factory
                .create(status, "", "", outcome.content, custom_data);
            let response = self.apply_normalizer(request.as_ref(), response);
            self.notify(EventType::ExecutionSuccess, request.as_ref(), Some(&response));
            response
        } else {
            let response = self.response_factory.create(
                outcome.status,
                "",
                &outcome.message,
                None,
                custom_data,
            );
            self.notify(EventType::ExecutionError, request.as_ref(), Some(&response));
            response
        };

        self.notify(EventType::PostExecute, request.as_ref(), Some(&response));
        self.trigger_listener(ListenerType::PostExecute, request.as_mut());

        if self.config.debug_mode {
            info!(
                method = request.method(),
                uri = %request.uri(),
                status = response.status_code,
                message = response.message.as_str(),
                "api call finished"
            );
        }

        response
    }

    fn do_request_async(&self, request: Box<dyn ApiRequest>) -> ApiResponse {
        debug!(
            method = request.method(),
            endpoint = request.endpoint(),
            "async dispatch requested"
        );
        self.response_factory.create(
            STATUS_INTERNAL_ERROR,
            "",
            ASYNC_NOT_IMPLEMENTED,
            None,
            request.custom_data().cloned(),
        )
    }

    fn find_mock(&self, request: &dyn ApiRequest) -> Option<TransportResult> {
        if !self.config.enable_mocks {
            return None;
        }
        let mock = self.mocks.find_match(request.endpoint())?;
        debug!(mock = mock.name(), status = mock.status(), "serving mock");
        Some(TransportResult::success(mock.status(), mock.content()))
    }

    fn apply_normalizer(&self, request: &dyn ApiRequest, response: ApiResponse) -> ApiResponse {
        match self.normalizers.find_match(request.endpoint()) {
            Some(normalizer) => {
                debug!(rule = normalizer.rule(), "applying normalizer");
                normalizer.normalize(response)
            }
            None => response,
        }
    }

    /// Internal hook first, then the external handler.
    fn notify(&self, event: EventType, request: &dyn ApiRequest, response: Option<&ApiResponse>) {
        if !self.config.enable_events {
            return;
        }
        self.hooks.on_event(event, request, response);

        if let Some(handler) = &self.event_handler {
            if let Some(api_event) =
                self.event_factory
                    .create(EventKind::External, event.as_str(), request, response)
            {
                handler.handle_event(&api_event);
            }
        }
    }

    fn trigger_listener(&self, listener: ListenerType, request: &mut dyn ApiRequest) {
        if !self.config.enable_listeners {
            return;
        }
        if let Some(item) = request.listener() {
            match listener {
                ListenerType::PreExecute => item.on_pre_execute(),
                ListenerType::PostExecute => item.on_post_execute(),
            }
        }
    }
}
