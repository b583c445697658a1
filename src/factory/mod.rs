//! Factories for requests, responses and events.

mod event;
mod request;
mod response;

pub use event::EventFactory;
pub use request::{default_request_catalog, RequestCatalog, RequestFactory, HTTP_REQUEST_TYPE};
pub use response::{
    default_decorator_catalog, CanonicalReasonDecorator, DecoratorCatalog, ResponseDecorator,
    ResponseFactory, CANONICAL_REASON_DECORATOR,
};
