//! Ellipsoïdes de référence des projections légères

/// Ellipsoïde défini par son demi-grand axe et son inverse d'aplatissement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Demi-grand axe en mètres
    pub a: f64,
    pub inv_f: f64,
}

/// WGS84 (UTM, Web Mercator)
pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_223_563,
};

/// GRS80 (Lambert-93)
pub const GRS80: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    inv_f: 298.257_222_101,
};

impl Ellipsoid {
    /// Première excentricité au carré
    pub fn e2(self) -> f64 {
        let f = 1.0 / self.inv_f;
        f * (2.0 - f)
    }

    pub fn e(self) -> f64 {
        self.e2().sqrt()
    }

    /// Seconde excentricité au carré
    pub fn ep2(self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }

    /// Rayon de courbure dans le premier vertical à la latitude `lat` (radians)
    pub fn normal_radius(self, lat: f64) -> f64 {
        self.a / (1.0 - self.e2() * lat.sin().powi(2)).sqrt()
    }
}
