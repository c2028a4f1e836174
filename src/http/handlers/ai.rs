//! `/api/ai/*`: one handler per tool, all routed through the orchestrator.

use axum::extract::State;
use axum::Extension;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::http::envelope::Envelope;
use crate::http::extract::JsonBody;
use crate::hub::Hub;
use crate::tools::ToolKind;
use crate::types::Result;

async fn run(hub: &Hub, auth: &AuthContext, kind: ToolKind, body: &Value) -> Result<Envelope> {
    let data = hub.orchestrator.invoke(auth, kind, body).await?;
    Ok(Envelope::ok().data(data))
}

macro_rules! tool_handler {
    ($name:ident, $kind:expr) => {
        pub async fn $name(
            State(hub): State<Arc<Hub>>,
            Extension(auth): Extension<AuthContext>,
            JsonBody(body): JsonBody<Value>,
        ) -> Result<Envelope> {
            run(&hub, &auth, $kind, &body).await
        }
    };
}

tool_handler!(chat, ToolKind::Chat);
tool_handler!(image, ToolKind::Image);
tool_handler!(resume, ToolKind::Resume);
tool_handler!(code, ToolKind::Code);
tool_handler!(study, ToolKind::Study);
tool_handler!(content, ToolKind::Content);
