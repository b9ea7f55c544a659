// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod fetch;
pub mod forms;
pub mod ids;
pub mod listview;
pub mod model;
pub mod session;
pub mod state;
pub mod telemetry;

pub use fetch::*;
pub use forms::*;
pub use ids::*;
pub use listview::*;
pub use model::*;
pub use session::*;
pub use state::*;
pub use telemetry::*;
