pub mod broker;
pub mod memory;
pub mod model;
pub mod pg;
pub mod process;
pub mod queue;
pub mod registry;
pub mod store;

pub use broker::{Broker, BrokerOptions};
pub use memory::MemoryTaskStore;
pub use model::{NewTask, Task, TaskStatus};
pub use pg::PgTaskStore;
pub use process::Process;
pub use queue::Queue;
pub use registry::{boxed, BoxFuture, HandlerRegistry, TaskError};
pub use store::{HandlerFilter, StatusCounts, TaskStore};
