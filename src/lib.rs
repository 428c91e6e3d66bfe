//! Blueprint SDK: derive query criteria, relation population and live-update
//! subscriptions from REST request parameters.

pub mod config;
pub mod criteria;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod json;
pub mod live;
pub mod populate;
pub mod query;
pub mod request;
pub mod response;
pub mod routes;
pub mod state;
pub mod subscribe;

pub use config::{
    apply_env_overrides, from_json_str, load_from_dir, resolve, BlueprintConfig, FullConfig, RelationConfig,
    RelationKind, ResolvedModel, ResolvedRoute, RouteOptions,
};
pub use criteria::{Blacklist, CriteriaResolver, WhereClause};
pub use error::{AppError, ConfigError};
pub use live::{MemoryLiveModel, MemoryRegistry};
pub use populate::{PopulationDirective, PopulationResolver};
pub use query::{FindQuery, PopulateOptions, QueryBuilder};
pub use request::{BlueprintRequest, RequestContext, RequestParams};
pub use routes::{blueprint_routes, common_routes};
pub use state::AppState;
pub use subscribe::{LiveModel, ModelRegistry, SubscriptionPlan, SubscriptionResolver};
