// Query module - READ SURFACE
// Request/response types and a frozen snapshot that answers them

mod pagination;
mod snapshot;
mod types;

pub use pagination::{paginate, PageRequest, PageResponse, DEFAULT_PAGE_LIMIT};
pub use snapshot::Snapshot;
pub use types::{
    DelegationResponse, Pool, QueryDelegationRequest, QueryDelegationResponse,
    QueryDelegatorDelegationsRequest, QueryDelegatorDelegationsResponse, QueryParamsRequest,
    QueryParamsResponse, QueryPoolRequest, QueryPoolResponse, QueryRedelegationsRequest,
    QueryRedelegationsResponse, QueryUnbondingDelegationRequest, QueryUnbondingDelegationResponse,
    QueryValidatorDelegationsRequest, QueryValidatorDelegationsResponse, QueryValidatorRequest,
    QueryValidatorResponse, QueryValidatorUnbondingDelegationsRequest,
    QueryValidatorUnbondingDelegationsResponse, QueryValidatorsRequest, QueryValidatorsResponse,
};
