//! Pool statistics for monitoring.

use super::ParticlePool;

/// Summary of a pool's current spread.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PoolStats {
    pub particle_count: usize,
    /// Mean position.
    pub centroid: [f32; 3],
    /// Mean Euclidean norm.
    pub mean_radius: f32,
    /// Largest Euclidean norm.
    pub max_radius: f32,
    /// Largest absolute coordinate.
    pub max_abs: f32,
    /// Particles with any non-finite coordinate.
    pub non_finite: usize,
}

impl PoolStats {
    /// Compute statistics from a pool.
    pub fn from_pool(pool: &ParticlePool) -> Self {
        let mut sum = [0.0f64; 3];
        let mut radius_sum = 0.0f64;
        let mut max_radius = 0.0f32;
        let mut max_abs = 0.0f32;
        let mut non_finite = 0usize;
        let mut finite = 0usize;

        for p in pool.particles() {
            if !p.is_finite() {
                non_finite += 1;
                continue;
            }
            finite += 1;
            sum[0] += p.x as f64;
            sum[1] += p.y as f64;
            sum[2] += p.z as f64;
            let r = p.norm();
            radius_sum += r as f64;
            max_radius = max_radius.max(r);
            max_abs = max_abs.max(p.max_abs());
        }

        let n = finite.max(1) as f64;
        Self {
            particle_count: pool.len(),
            centroid: [
                (sum[0] / n) as f32,
                (sum[1] / n) as f32,
                (sum[2] / n) as f32,
            ],
            mean_radius: (radius_sum / n) as f32,
            max_radius,
            max_abs,
            non_finite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ParticleState;
    use crate::schema::SeedStrategy;

    #[test]
    fn test_stats_of_known_pool() {
        let mut pool = ParticlePool::new(3, SeedStrategy::origin_cube(0.0), Some(1)).unwrap();
        pool.set(0, ParticleState::new(3.0, 4.0, 0.0));
        pool.set(1, ParticleState::new(-3.0, -4.0, 0.0));
        pool.set(2, ParticleState::new(f32::NAN, 0.0, 0.0));

        let stats = PoolStats::from_pool(&pool);
        assert_eq!(stats.particle_count, 3);
        assert_eq!(stats.non_finite, 1);
        assert_eq!(stats.centroid, [0.0, 0.0, 0.0]);
        assert!((stats.mean_radius - 5.0).abs() < 1e-6);
        assert_eq!(stats.max_radius, 5.0);
        assert_eq!(stats.max_abs, 4.0);
    }
}
