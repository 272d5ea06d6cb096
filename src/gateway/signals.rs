use actix::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Realtime Wire Protocol
// ============================================================================
//
// Every text frame carries one invocation object:
//
//   {"target": "CreateOrder", "arguments": ["Burger", "No onions", 2]}
//
// Client → server targets: OnLoad, CreateOrder, CompleteOrder
// Server → client targets: ReceiveOrders, Error (one string argument each)
//
// ============================================================================

/// Signal pushed from the server to a connected client
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum ServerSignal {
    /// JSON array of order views, as a string
    ReceiveOrders(String),
    /// Plain-text error for the calling client only
    Error(String),
}

#[derive(Serialize)]
struct OutboundFrame<'a> {
    target: &'a str,
    arguments: [&'a str; 1],
}

impl ServerSignal {
    pub fn target(&self) -> &'static str {
        match self {
            ServerSignal::ReceiveOrders(_) => "ReceiveOrders",
            ServerSignal::Error(_) => "Error",
        }
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let payload = match self {
            ServerSignal::ReceiveOrders(json) => json,
            ServerSignal::Error(message) => message,
        };

        serde_json::to_string(&OutboundFrame {
            target: self.target(),
            arguments: [payload.as_str()],
        })
    }
}

#[derive(Deserialize)]
struct InboundFrame {
    target: String,
    #[serde(default)]
    arguments: Vec<Value>,
}

/// A client invocation decoded from a text frame
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    OnLoad,
    CreateOrder {
        title: Option<String>,
        description: Option<String>,
        quantity: i32,
    },
    CompleteOrder {
        order_id: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Malformed invocation: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown method '{0}'")]
    UnknownTarget(String),

    #[error("Invalid arguments for '{target}': {reason}")]
    BadArguments { target: String, reason: String },
}

impl ClientCall {
    pub fn parse(text: &str) -> Result<Self, InvocationError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        let mut args = Arguments {
            target: &frame.target,
            values: frame.arguments.into_iter(),
            position: 0,
        };

        let call = match frame.target.as_str() {
            "OnLoad" => ClientCall::OnLoad,
            "CreateOrder" => ClientCall::CreateOrder {
                title: args.next("title")?,
                description: args.next("description")?,
                quantity: args.next("quantity")?,
            },
            "CompleteOrder" => ClientCall::CompleteOrder {
                order_id: args.next("orderId")?,
            },
            other => return Err(InvocationError::UnknownTarget(other.to_string())),
        };

        args.finish()?;
        Ok(call)
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ClientCall::OnLoad => "OnLoad",
            ClientCall::CreateOrder { .. } => "CreateOrder",
            ClientCall::CompleteOrder { .. } => "CompleteOrder",
        }
    }
}

/// Positional argument reader for one invocation
struct Arguments<'a> {
    target: &'a str,
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl Arguments<'_> {
    fn next<T: serde::de::DeserializeOwned>(&mut self, name: &str) -> Result<T, InvocationError> {
        self.position += 1;
        let value = self.values.next().ok_or_else(|| self.bad(format!("missing '{}'", name)))?;
        serde_json::from_value(value).map_err(|e| self.bad(format!("'{}': {}", name, e)))
    }

    fn finish(self) -> Result<(), InvocationError> {
        let extra = self.values.len();
        if extra > 0 {
            return Err(self.bad(format!("{} unexpected argument(s)", extra)));
        }
        Ok(())
    }

    fn bad(&self, reason: String) -> InvocationError {
        InvocationError::BadArguments {
            target: self.target.to_string(),
            reason,
        }
    }
}
