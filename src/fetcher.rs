use crate::domains::{Domain, DomainSource};
use crate::dto::Pagination;
use crate::error::Result;
use crate::filters::FilterSet;
use tracing::{debug, warn};

/// One merged list + totals response.
#[derive(Debug, Clone)]
pub struct FetchOutcome<D: Domain> {
    pub rows: Vec<D::Row>,
    pub pagination: Pagination,
    /// `None` when the totals call failed or the domain has none.
    pub totals: Option<D::Totals>,
    /// The filters `rows` belong to. Differs from the request only in the
    /// page number, when the requested page was past the end.
    pub filters: D::Filters,
}

/// Fetches one page and the aggregate totals for `filters` concurrently.
///
/// A failed list call fails the whole fetch. A failed totals call is logged
/// and reported as `totals: None`. A page past the last one is fetched
/// again at the last page so rows, pagination and filters agree.
pub async fn fetch_page<D: Domain>(
    source: &dyn DomainSource<D>,
    filters: &D::Filters,
) -> Result<FetchOutcome<D>> {
    let list_params = filters.query_params();
    debug!("Fetching {} with {}", D::NAME, list_params.to_query_string());

    let (list, totals) = if D::HAS_TOTALS {
        let totals_params = filters.totals_params();
        let (list, totals) = tokio::join!(source.list(&list_params), source.totals(&totals_params));
        (list, Some(totals))
    } else {
        (source.list(&list_params).await, None)
    };

    let mut page = list?;
    let totals = match totals {
        Some(Ok(totals)) => Some(totals),
        Some(Err(err)) => {
            warn!("Totals for {} unavailable: {}", D::NAME, err);
            None
        }
        None => None,
    };

    let requested = filters.page_request().page;
    let mut pagination = paginate(requested, page.pagination);
    let mut effective = filters.clone();

    if pagination.total_pages > 0 && pagination.page != requested {
        effective.page_request_mut().page = pagination.page;
        debug!(
            "Page {} of {} is past the end, fetching page {}",
            requested,
            D::NAME,
            pagination.page
        );
        page = source.list(&effective.query_params()).await?;
        pagination = paginate(pagination.page, page.pagination);
    }
    effective.page_request_mut().page = pagination.page;

    Ok(FetchOutcome {
        rows: page.rows,
        pagination,
        totals,
        filters: effective,
    })
}

/// Server pagination made consistent for the page that was asked for.
fn paginate(requested: u32, reported: Pagination) -> Pagination {
    let pagination = Pagination {
        page: requested,
        ..reported
    }
    .normalized();
    if pagination != reported {
        debug!("Adjusted pagination {:?} to {:?}", reported, pagination);
    }
    if !reported.is_consistent() {
        warn!("Server pagination was inconsistent ({:?}), using {:?}", reported, pagination);
    }
    pagination
}
