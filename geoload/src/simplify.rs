//! Simplification des géométries (Douglas-Peucker) avec garde topologique
//!
//! Un polygone simplifié invalide (anneau effondré, auto-intersection, trou
//! hors de l'enveloppe) est remplacé par sa géométrie d'origine. Il en va de
//! même d'un multipolygone dont les parties se chevauchent après
//! simplification, et d'une multiligne dont les lignes se mettent à se croiser.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{
    BoundingRect, Contains, CoordsIter, Geometry, GeometryCollection, Line, LineString,
    MultiLineString, MultiPolygon, Point, Polygon, Rect, Simplify,
};
use tracing::{debug, warn};

use crate::types::{GeoFrame, Record};
use crate::GeoLoadError;

/// Tolérance par défaut, en unités du CRS
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Simplifie toutes les géométries d'un frame.
///
/// N'échoue jamais : en cas d'erreur (tolérance invalide, coordonnées non
/// finies) l'erreur est journalisée et le frame est retourné inchangé.
pub fn simplify_geometries(frame: GeoFrame, tolerance: f64) -> GeoFrame {
    match simplify_records(&frame.records, tolerance) {
        Ok(records) => {
            debug!(rows = records.len(), tolerance, "Geometries simplified");
            GeoFrame { records, ..frame }
        }
        Err(e) => {
            warn!(error = %e, tolerance, "Simplification skipped, geometries left unchanged");
            frame
        }
    }
}

fn simplify_records(records: &[Record], tolerance: f64) -> Result<Vec<Record>, GeoLoadError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GeoLoadError::Simplify(format!("invalid tolerance {}", tolerance)));
    }

    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let geometry = record
                .geometry
                .as_ref()
                .map(|g| {
                    if !g.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
                        return Err(GeoLoadError::Simplify(format!(
                            "non-finite coordinate in row {}",
                            row
                        )));
                    }
                    Ok(simplify_geometry(g, tolerance))
                })
                .transpose()?;
            Ok(Record::new(record.attributes.clone(), geometry))
        })
        .collect()
}

fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Geometry {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&tolerance)),
        Geometry::MultiLineString(mls) => {
            Geometry::MultiLineString(simplify_multi_line_string(mls, tolerance))
        }
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(simplify_multi_polygon(mp, tolerance)),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter().map(|g| simplify_geometry(g, tolerance)).collect(),
        )),
        // Points, segments, rectangles et triangles : déjà minimaux
        other => other.clone(),
    }
}

/// Les lignes peuvent se croiser entre elles, mais la simplification ne doit
/// pas introduire de croisement absent de l'original
fn simplify_multi_line_string(mls: &MultiLineString, tolerance: f64) -> MultiLineString {
    let simplified = mls.simplify(&tolerance);
    if components_cross(&simplified) && !components_cross(mls) {
        debug!("Simplified lines now cross each other, keeping original");
        mls.clone()
    } else {
        simplified
    }
}

fn simplify_polygon(polygon: &Polygon, tolerance: f64) -> Polygon {
    let simplified = polygon.simplify(&tolerance);
    if is_valid_polygon(&simplified) {
        simplified
    } else {
        debug!("Simplified polygon is invalid, keeping original");
        polygon.clone()
    }
}

fn simplify_multi_polygon(mp: &MultiPolygon, tolerance: f64) -> MultiPolygon {
    let simplified = MultiPolygon::new(mp.0.iter().map(|p| simplify_polygon(p, tolerance)).collect());
    if parts_disjoint(&simplified) {
        simplified
    } else {
        debug!("Simplified parts now overlap, keeping original multipolygon");
        mp.clone()
    }
}

/// Segment d'un anneau ou d'une ligne, repéré par sa composante
#[derive(Clone, Copy)]
struct Segment {
    component: usize,
    index: usize,
    line: Line,
    bounds: Rect,
}

fn segments_of(lines: &[&LineString]) -> Vec<Segment> {
    lines
        .iter()
        .copied()
        .enumerate()
        .flat_map(|(component, ls)| {
            ls.lines().enumerate().map(move |(index, line)| Segment {
                component,
                index,
                line,
                bounds: line.bounding_rect(),
            })
        })
        .collect()
}

/// Balayage sur x : `conflict` n'est appelé que pour les paires dont les
/// emprises se chevauchent
fn any_conflict<F>(mut segments: Vec<Segment>, mut conflict: F) -> bool
where
    F: FnMut(&Segment, &Segment) -> bool,
{
    segments.sort_by(|a, b| a.bounds.min().x.total_cmp(&b.bounds.min().x));

    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            if b.bounds.min().x > a.bounds.max().x {
                break;
            }
            if a.bounds.max().y < b.bounds.min().y || b.bounds.max().y < a.bounds.min().y {
                continue;
            }
            if conflict(a, b) {
                return true;
            }
        }
    }
    false
}

/// Anneaux fermés d'au moins 4 coordonnées, aucun croisement entre segments,
/// trous à l'intérieur de l'enveloppe
fn is_valid_polygon(polygon: &Polygon) -> bool {
    let rings: Vec<&LineString> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();

    if rings.iter().any(|r| r.0.len() < 4 || !r.is_closed()) {
        return false;
    }

    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    let holes_inside = polygon.interiors().iter().all(|hole| {
        hole.0
            .first()
            .map_or(false, |c| shell.contains(&Point::from(*c)))
    });
    if !holes_inside {
        return false;
    }

    !any_conflict(segments_of(&rings), |a, b| {
        let adjacent = a.component == b.component && {
            let count = rings[a.component].0.len() - 1;
            let (lo, hi) = (a.index.min(b.index), a.index.max(b.index));
            hi == lo + 1 || (lo == 0 && hi == count - 1)
        };

        match line_intersection(a.line, b.line) {
            None => false,
            // Segments consécutifs : seul le sommet commun est admis
            Some(LineIntersection::SinglePoint { is_proper: false, .. }) if adjacent => false,
            Some(_) => true,
        }
    })
}

/// Vrai si deux lignes distinctes se touchent ou se croisent
fn components_cross(mls: &MultiLineString) -> bool {
    let lines: Vec<&LineString> = mls.0.iter().collect();
    any_conflict(segments_of(&lines), |a, b| {
        a.component != b.component && line_intersection(a.line, b.line).is_some()
    })
}

/// Parties valides, sans contact entre elles ni inclusion de l'une dans
/// l'autre (hors trous)
fn parts_disjoint(mp: &MultiPolygon) -> bool {
    if !mp.0.iter().all(is_valid_polygon) {
        return false;
    }

    let mut rings = Vec::new();
    let mut owner = Vec::new();
    for (part, polygon) in mp.0.iter().enumerate() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            rings.push(ring);
            owner.push(part);
        }
    }

    let touching = any_conflict(segments_of(&rings), |a, b| {
        owner[a.component] != owner[b.component] && line_intersection(a.line, b.line).is_some()
    });
    if touching {
        return false;
    }

    // Sans contact, une partie est soit dehors soit entièrement dedans :
    // un sommet suffit
    let bounds: Vec<Option<Rect>> = mp.0.iter().map(|p| p.bounding_rect()).collect();
    mp.0.iter().enumerate().all(|(i, inner)| {
        let Some(first) = inner.exterior().0.first() else {
            return true;
        };
        mp.0.iter().enumerate().all(|(j, outer)| {
            let inside_bounds = bounds[j].map_or(false, |r| {
                r.min().x <= first.x && first.x <= r.max().x && r.min().y <= first.y && first.y <= r.max().y
            });
            i == j || !inside_bounds || !outer.contains(&Point::from(*first))
        })
    })
}
