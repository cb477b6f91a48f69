use futures::stream::BoxStream;
use paystream_core::event::StreamEvent;

use crate::api::ClientError;

/// Events of one in-flight invocation, in upstream emission order.
pub type EventStream<'a> = BoxStream<'a, Result<StreamEvent, ClientError>>;
