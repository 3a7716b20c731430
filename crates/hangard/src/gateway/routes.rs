//! Path resolution.

use hangar_proxy::EntityKind;

use super::GatewayError;

const HEALTHCHECK: &str = "healthcheck";

/// Resource addressed by a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Root,
    /// `/healthcheck`
    Healthcheck,
    /// `/<route>`: every entity of a kind.
    Collection(EntityKind),
    /// `/<route>/<id>`: one entity.
    Item(EntityKind, i64),
}

impl Route {
    /// Resolves a request path.
    ///
    /// A query string and one trailing slash are ignored. IDs are unsigned
    /// decimal integers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedRequest`] for relative paths and
    /// [`GatewayError::UnknownResource`] when nothing matches.
    pub fn parse(path: &str) -> Result<Self, GatewayError> {
        let unknown = || GatewayError::UnknownResource {
            path: path.to_owned(),
        };
        let resource = path.split('?').next().unwrap_or_default();
        let Some(relative) = resource.strip_prefix('/') else {
            return Err(GatewayError::malformed(format!(
                "path `{path}` must start with `/`"
            )));
        };
        let trimmed = relative.strip_suffix('/').unwrap_or(relative);
        let segments: Vec<&str> = trimmed.split('/').collect();

        match segments.as_slice() {
            [""] => Ok(Self::Root),
            [HEALTHCHECK] => Ok(Self::Healthcheck),
            [route] => EntityKind::from_route(route)
                .map(Self::Collection)
                .ok_or_else(unknown),
            [route, id] => {
                let kind = EntityKind::from_route(route).ok_or_else(unknown)?;
                parse_id(id).map(|id| Self::Item(kind, id)).ok_or_else(unknown)
            }
            _ => Err(unknown()),
        }
    }
}

fn parse_id(segment: &str) -> Option<i64> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/", Route::Root)]
    #[case("/healthcheck", Route::Healthcheck)]
    #[case("/facility", Route::Collection(EntityKind::Facility))]
    #[case("/facility/", Route::Collection(EntityKind::Facility))]
    #[case("/supplierfacility/12", Route::Item(EntityKind::SupplierToFacility, 12))]
    #[case("/customer/3?verbose=1", Route::Item(EntityKind::Customer, 3))]
    fn resolves_known_paths(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(Route::parse(path).expect("route"), expected);
    }

    #[rstest]
    #[case("/hangar")]
    #[case("/Facility")]
    #[case("/facility/-1")]
    #[case("/facility/abc")]
    #[case("/facility/1/extra")]
    #[case("/facility/99999999999999999999")]
    fn unknown_paths_are_not_found(#[case] path: &str) {
        let error = Route::parse(path).expect_err("unknown");
        assert_eq!(error.status(), 404);
    }

    #[test]
    fn relative_paths_are_malformed() {
        let error = Route::parse("facility").expect_err("relative");
        assert_eq!(error.status(), 400);
    }
}
