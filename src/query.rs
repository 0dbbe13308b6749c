//! Request construction for the provider's `FullSearch` GraphQL operation.

use crate::models::SearchRequest;
use serde_json::{json, Value};

/// The full query document sent with every request. The provider rejects
/// anything that does not match the document its own web client sends, so
/// this is kept verbatim in a separate file.
pub const FULL_SEARCH_QUERY: &str = include_str!("full_search.graphql");

/// Session context echoed in every request. The provider expects a
/// plausible search-results path here; the concrete values are not
/// interpreted server-side beyond format checks.
const RAW_SESSION_QUERY: &str = "/searchresults.en-gb.html?label=gen173nr-1BCAEoggI46AdIM1gEaN0BiAEBmAEJuAEXyAEM2AEB6AEBiAIBqAIDuAK-xsCzBsACAdICJGE1MjFhMmVkLTYyNDgtNDg0MC04NTcxLWM4NzcxYTFhZWQ2OdgCBeACAQ&sid=56b869f50c3ca1f92a94af874ce38d13&aid=304142&ss=Osaka&ssne=Osaka&ssne_untouched=Osaka&lang=en-gb&sb=1&src_elem=sb&src=index&dest_id=-240905&dest_type=city&checkin=2024-07-05&checkout=2024-07-06&group_adults=1&no_rooms=1&group_children=1&age=0&selected_currency=USD";

/// Hotel-only property filter. `204` is the provider's accommodation-type
/// id for hotels.
pub const HOTEL_FILTER: &str = "ht_id=204";

/// Endpoint URL with the display currency attached. The currency rides in
/// the URL, not the payload.
pub fn endpoint_url(base: &str, currency: &str) -> String {
    format!("{}?selected_currency={}", base, currency)
}

/// Destination search string in the form the provider's own search box
/// produces for a city search.
pub fn destination(city: &str, country: &str) -> String {
    format!("{}, {}", city, country)
}

/// Build the JSON body for one page of a search.
///
/// `offset` is a row offset, not a page number; page N starts at
/// `N * page_size`.
pub fn search_payload(request: &SearchRequest, offset: i64, page_size: i64) -> Value {
    let check_in = request.check_in.to_string();
    let check_out = request.check_out.to_string();

    let filters = if request.hotels_only {
        json!({ "selectedFilters": HOTEL_FILTER })
    } else {
        json!({})
    };

    json!({
        "operationName": "FullSearch",
        "variables": {
            "input": {
                "acidCarouselContext": null,
                "childrenAges": [0],
                "dates": {
                    "checkin": check_in,
                    "checkout": check_out,
                },
                "doAvailabilityCheck": false,
                "encodedAutocompleteMeta": null,
                "enableCampaigns": true,
                "filters": filters,
                "flexibleDatesConfig": {
                    "broadDatesCalendar": {
                        "checkinMonths": [],
                        "los": [],
                        "startWeekdays": [],
                    },
                    "dateFlexUseCase": "DATE_RANGE",
                    "dateRangeCalendar": {
                        "checkin": [check_in],
                        "checkout": [check_out],
                    },
                },
                "forcedBlocks": null,
                "location": {
                    "searchString": destination(&request.city, &request.country),
                    "destType": "CITY",
                },
                "metaContext": {
                    "metaCampaignId": 0,
                    "externalTotalPrice": null,
                    "feedPrice": null,
                    "hotelCenterAccountId": null,
                    "rateRuleId": null,
                    "dragongateTraceId": null,
                    "pricingProductsTag": null,
                },
                "nbRooms": request.rooms,
                "nbAdults": request.adults,
                "nbChildren": request.children,
                "needsRoomsMatch": false,
                "optionalFeatures": {
                    "forceArpExperiments": true,
                    "testProperties": false,
                },
                "pagination": {
                    "rowsPerPage": page_size,
                    "offset": offset,
                },
                "rawQueryForSession": RAW_SESSION_QUERY,
                "referrerBlock": {
                    "blockName": "searchbox",
                },
                "sbCalendarOpen": false,
                "sorters": {
                    "selectedSorter": null,
                    "referenceGeoId": null,
                    "tripTypeIntentId": null,
                },
                "travelPurpose": 2,
                "seoThemeIds": [],
                "useSearchParamsFromSession": true,
                "merchInput": {
                    "testCampaignIds": [],
                },
            },
            "carouselLowCodeExp": false,
        },
        "extensions": {},
        "query": FULL_SEARCH_QUERY,
    })
}
