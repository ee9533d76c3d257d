//! Frame-by-frame evolution of photons on a board of optical elements.
//!
//! Each frame is produced from the previous one by propagating every photon a
//! single step and then letting it interact with whatever element occupies
//! its tile. Probability lost along the way is recorded per frame, either at
//! the tile that absorbed it or as having left the board.

use serde::{ Deserialize, Serialize };
use thiserror::Error;
use tracing::{ debug, trace };
use crate::{
    measurement::{ Measurement, MeasurementError, NamedVector },
    photons::{
        Direction,
        InteractionOperator,
        PhotonError,
        Photons,
        elements::ElementKind,
        merge_placements,
        ops,
    },
    tensor::{ Dimension, Operator, TensorError, Vector, VectorEntry },
};

#[derive(Debug, Error)]
pub enum SimError {
    /// `initialize_from_laser: no laser`
    #[error("initialize_from_laser: grid has no laser")]
    NoLaser,

    /// `simulation: not initialized`
    #[error("simulation: no initial frame; initialize the simulation first")]
    NotInitialized,

    #[error("grid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("photon error: {0}")]
    Photon(#[from] PhotonError),

    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),

    #[error("measurement error: {0}")]
    Measurement(#[from] MeasurementError),
}
pub type SimResult<T> = Result<T, SimError>;

/// Parameters controlling frame generation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maximum number of frames generated after the initial one.
    pub max_frames: usize,
    /// Frame generation stops once the total probability drops below this.
    pub stop_threshold: f64,
    /// If `true`, `^` decreases *y* and `v` increases it.
    pub y_dir_means_down: bool,
    /// Absorption probabilities at or below this are not recorded.
    pub absorption_eps: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_frames: 20,
            stop_threshold: 1e-6,
            y_dir_means_down: true,
            absorption_eps: 1e-12,
        }
    }
}

impl SimulationConfig {
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_stop_threshold(mut self, stop_threshold: f64) -> Self {
        self.stop_threshold = stop_threshold;
        self
    }

    pub fn with_y_dir_means_down(mut self, y_dir_means_down: bool) -> Self {
        self.y_dir_means_down = y_dir_means_down;
        self
    }

    pub fn with_absorption_eps(mut self, absorption_eps: f64) -> Self {
        self.absorption_eps = absorption_eps;
        self
    }
}

/// A single occupied cell of a [`Grid`].
///
/// `rotation` is in degrees counter-clockwise from `>` and orients lasers,
/// mirrors, and beam splitters; `polarization` is in degrees from horizontal
/// and sets the axis of polarizers and wave plates, or the emitted
/// polarization of a laser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub element: ElementKind,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub polarization: f64,
}

/// Description of a board and its contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Grid {
    /// Parse a grid from JSON.
    pub fn from_json(s: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Return the first laser on the grid, if any.
    pub fn laser(&self) -> Option<&Cell> {
        self.cells.iter().find(|c| c.element == ElementKind::Laser)
    }

    /// Return the operators of all interacting cells, in cell order.
    pub fn placements(&self) -> SimResult<Vec<Placement>> {
        let mut placements: Vec<Placement> = Vec::new();
        for cell in self.cells.iter() {
            if let Some(operator)
                = cell.element.operator(cell.rotation, cell.polarization)?
            {
                placements.push(Placement { x: cell.x, y: cell.y, operator });
            }
        }
        Ok(placements)
    }
}

/// A direction ⊗ polarization operator acting at tile `(x, y)`.
#[derive(Clone, Debug)]
pub struct Placement {
    pub x: usize,
    pub y: usize,
    pub operator: Operator,
}

/// Where probability was lost.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AbsorptionSite {
    Tile { x: usize, y: usize },
    OffBoard,
}

/// Probability lost during a single frame at a single site.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Absorption {
    pub site: AbsorptionSite,
    pub probability: f64,
}

/// A snapshot of the simulation.
#[derive(Clone, Debug)]
pub struct Frame {
    pub photons: Photons,
    /// Total probability remaining on the board.
    pub probability: f64,
    /// Probability lost while producing this frame from the previous one.
    pub absorptions: Vec<Absorption>,
}

impl Frame {
    /// Return the total probability lost while producing this frame.
    pub fn total_absorbed(&self) -> f64 {
        self.absorptions.iter().map(|a| a.probability).sum()
    }
}

#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimulationConfig,
    size_x: usize,
    size_y: usize,
    placements: Vec<Placement>,
    laser: Option<Cell>,
    interaction: InteractionOperator,
    frames: Vec<Frame>,
}

impl Simulation {
    /// Set up a simulation for the contents of `grid`.
    ///
    /// No frames exist until one of the `initialize_*` methods is called.
    pub fn new(grid: &Grid, config: SimulationConfig) -> SimResult<Self> {
        let mut sim
            = Self::from_placements(grid.cols, grid.rows, grid.placements()?, config)?;
        sim.laser = grid.laser().cloned();
        Ok(sim)
    }

    /// Set up a simulation on an empty board of the given size with explicit
    /// element placements.
    ///
    /// Placements sharing a tile are composed into one, in order.
    pub fn from_placements(
        size_x: usize,
        size_y: usize,
        placements: Vec<Placement>,
        config: SimulationConfig,
    ) -> SimResult<Self>
    {
        let placements: Vec<Placement>
            = merge_placements(placements.iter().map(|p| (p.x, p.y, &p.operator)))?
            .into_iter()
            .map(|(x, y, operator)| Placement { x, y, operator })
            .collect();
        let interaction
            = InteractionOperator::new(
                size_x,
                size_y,
                placements.iter().map(|p| (p.x, p.y, &p.operator)),
            )?;
        Ok(Self {
            config,
            size_x,
            size_y,
            placements,
            laser: None,
            interaction,
            frames: Vec::new(),
        })
    }

    /// Return the configuration.
    pub fn config(&self) -> &SimulationConfig { &self.config }

    /// Return the element placements.
    pub fn placements(&self) -> &[Placement] { &self.placements }

    /// Start from a single photon emitted by the grid's laser.
    pub fn initialize_from_laser(&mut self) -> SimResult<()> {
        let laser = self.laser.as_ref().ok_or(SimError::NoLaser)?;
        let dir = Direction::from_rotation(laser.rotation)?;
        let pol = ops::linear_polarization(laser.polarization.to_radians());
        let mut photons = Photons::new(self.size_x, self.size_y);
        photons.add_photon_with_polarization(laser.x, laser.y, dir, &pol)?;
        self.initialize_from_photons(photons)
    }

    /// Start from a single photon with direction and polarization given by
    /// name, e.g. `">"` and `"V"`.
    pub fn initialize_from_indicator(
        &mut self,
        x: usize,
        y: usize,
        dir: &str,
        pol: &str,
    ) -> SimResult<()>
    {
        let mut photons = Photons::new(self.size_x, self.size_y);
        photons.add_photon_from_indicator(x, y, dir, pol)?;
        self.initialize_from_photons(photons)
    }

    /// Start from an arbitrary photon state, discarding any existing frames.
    ///
    /// Fails if `photons` lives on a board of a different size.
    pub fn initialize_from_photons(&mut self, photons: Photons) -> SimResult<()> {
        Dimension::check_dimensions(
            &Photons::new(self.size_x, self.size_y).photon_dimensions(),
            &photons.photon_dimensions(),
        )?;
        let probability = photons.total_probability();
        debug!(n_photons = photons.n_photons(), probability, "initialized simulation");
        self.frames = vec![Frame { photons, probability, absorptions: Vec::new() }];
        Ok(())
    }

    /// Compute the frame following the last one, without storing it.
    pub fn next_frame(&self) -> SimResult<Frame> {
        let last = self.last_frame()?;
        let mut photons = last.photons.clone();
        let before = photons.total_probability();
        photons.propagate_photons(self.config.y_dir_means_down);
        let propagated = photons.total_probability();

        let mut absorptions: Vec<Absorption> = Vec::new();
        for p in self.placements.iter() {
            let probability
                = photons.measure_absorption_at_operator(p.x, p.y, &p.operator)?;
            trace!(x = p.x, y = p.y, probability, "tile absorption");
            if probability > self.config.absorption_eps {
                absorptions.push(Absorption {
                    site: AbsorptionSite::Tile { x: p.x, y: p.y },
                    probability,
                });
            }
        }
        let leaked = before - propagated;
        if leaked > self.config.absorption_eps {
            absorptions.push(
                Absorption { site: AbsorptionSite::OffBoard, probability: leaked });
        }

        photons.interact(&self.interaction)?;
        let probability = photons.total_probability();
        debug!(
            frame = self.frames.len(),
            probability,
            lost = before - probability,
            "computed frame",
        );
        Ok(Frame { photons, probability, absorptions })
    }

    /// Compute the next frame and store it.
    pub fn step(&mut self) -> SimResult<&Frame> {
        let frame = self.next_frame()?;
        self.frames.push(frame);
        self.last_frame()
    }

    /// Generate frames until the total probability drops below
    /// [`SimulationConfig::stop_threshold`] or
    /// [`SimulationConfig::max_frames`] new frames have been produced.
    pub fn generate_frames(&mut self) -> SimResult<&[Frame]> {
        let mut generated: usize = 0;
        while generated < self.config.max_frames
            && self.last_frame()?.probability >= self.config.stop_threshold
        {
            self.step()?;
            generated += 1;
        }
        Ok(&self.frames)
    }

    /// Return all frames, starting with the initial one.
    pub fn frames(&self) -> &[Frame] { &self.frames }

    /// Return the most recent frame.
    pub fn last_frame(&self) -> SimResult<&Frame> {
        self.frames.last().ok_or(SimError::NotInitialized)
    }

    /// Measure the positions of all photons in the last frame.
    ///
    /// Photons are measured in order, each over every tile it occupies; the
    /// resulting branches are named by the tile, `"x,y"`, and retain direction
    /// and polarization.
    pub fn measure(&self) -> SimResult<Measurement> {
        let photons = &self.last_frame()?.photons;
        let pos_dims: Vec<Dimension>
            = photons.photon_dimensions().into_iter().take(2).collect();
        let mut measurement = Measurement::from_vector(photons.vector().clone());
        for i in 0..photons.n_photons() {
            let [ix, iy, _, _] = Photons::photon_indices(i);
            let mut tiles: Vec<(usize, usize)> = Vec::new();
            for e in photons.vector().entries() {
                let tile = (e.coord[ix], e.coord[iy]);
                if !tiles.contains(&tile) { tiles.push(tile); }
            }
            let projections: Vec<NamedVector>
                = tiles.into_iter()
                .map(|(x, y)| {
                    let vector = Vector::new_unchecked(
                        vec![VectorEntry::new([x, y], 1.0.into())],
                        pos_dims.clone(),
                    );
                    NamedVector::new(format!("{},{}", x, y), vector)
                })
                .collect();
            // earlier photons' positions have been contracted away
            measurement
                = measurement
                .projective_measurement(&[2 * i, 2 * i + 1], &projections, &[])?;
        }
        Ok(measurement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photons::elements;

    const SPLITTER_GRID: &str = r#"{
        "cols": 3,
        "rows": 3,
        "cells": [
            { "x": 0, "y": 1, "element": "Laser", "polarization": 90.0 },
            { "x": 1, "y": 1, "element": "BeamSplitter", "rotation": 135.0 },
            { "x": 2, "y": 1, "element": "Detector" },
            { "x": 1, "y": 2, "element": "Detector" }
        ]
    }"#;

    #[test]
    fn free_propagation() {
        let mut sim
            = Simulation::from_placements(3, 5, Vec::new(), SimulationConfig::default())
            .unwrap();
        sim.initialize_from_indicator(0, 2, ">", "V").unwrap();
        let frames = sim.generate_frames().unwrap();
        assert_eq!(frames.len(), 4);
        let kets: Vec<String>
            = frames.iter().map(|f| f.photons.to_string()).collect();
        assert_eq!(
            kets,
            vec![
                "(1.00 +0.00i) |0,2,>,V⟩",
                "(1.00 +0.00i) |1,2,>,V⟩",
                "(1.00 +0.00i) |2,2,>,V⟩",
                "",
            ],
        );
        assert!(frames[2].absorptions.is_empty());
        assert_eq!(frames[3].absorptions.len(), 1);
        assert_eq!(frames[3].absorptions[0].site, AbsorptionSite::OffBoard);
        assert!((frames[3].absorptions[0].probability - 1.0).abs() < 1e-12);
        assert!(frames[3].probability < 1e-12);
    }

    #[test]
    fn frame_budget() {
        let config = SimulationConfig::default().with_max_frames(2);
        let mut sim = Simulation::from_placements(10, 1, Vec::new(), config).unwrap();
        sim.initialize_from_indicator(0, 0, ">", "H").unwrap();
        assert_eq!(sim.generate_frames().unwrap().len(), 3);
        assert_eq!(
            sim.last_frame().unwrap().photons.to_string(),
            "(1.00 +0.00i) |2,0,>,H⟩",
        );
    }

    #[test]
    fn uninitialized() {
        let sim
            = Simulation::from_placements(2, 2, Vec::new(), SimulationConfig::default())
            .unwrap();
        assert!(matches!(sim.next_frame(), Err(SimError::NotInitialized)));
        assert!(matches!(sim.measure(), Err(SimError::NotInitialized)));
        let mut sim = sim;
        assert!(matches!(sim.initialize_from_laser(), Err(SimError::NoLaser)));
        assert!(matches!(
            sim.initialize_from_photons(Photons::new(3, 3)),
            Err(SimError::Tensor(_))
        ));
    }

    #[test]
    fn shared_tile_absorption() {
        let placements = vec![
            Placement { x: 1, y: 1, operator: elements::absorber() },
            Placement { x: 1, y: 1, operator: elements::attenuator(0.5) },
        ];
        let mut sim
            = Simulation::from_placements(3, 3, placements, SimulationConfig::default())
            .unwrap();
        assert_eq!(sim.placements().len(), 1);
        let mut photons = Photons::new(3, 3);
        photons.add_photon_from_indicator(0, 1, ">", "V").unwrap();
        photons.add_photon_from_indicator(2, 1, "<", "V").unwrap();
        sim.initialize_from_photons(photons).unwrap();
        let before = sim.last_frame().unwrap().probability;
        let frame = sim.step().unwrap();
        assert_eq!(frame.absorptions.len(), 1);
        assert_eq!(frame.absorptions[0].site, AbsorptionSite::Tile { x: 1, y: 1 });
        assert!((frame.total_absorbed() - (before - frame.probability)).abs() < 1e-12);
        assert!((frame.total_absorbed() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grid_parsing() {
        let grid = Grid::from_json(SPLITTER_GRID).unwrap();
        assert_eq!((grid.cols, grid.rows), (3, 3));
        assert_eq!(grid.cells.len(), 4);
        assert_eq!(grid.cells[1].element, ElementKind::BeamSplitter);
        assert_eq!(grid.cells[2].rotation, 0.0);
        let laser = grid.laser().unwrap();
        assert_eq!((laser.x, laser.y), (0, 1));
        let placements = grid.placements().unwrap();
        assert_eq!(placements.len(), 3);
        assert!(
            placements[0].operator
                .is_close_to(&elements::beam_splitter(135.0).unwrap(), 1e-12)
                .unwrap()
        );
        assert!(matches!(Grid::from_json("{ \"cols\": 3 }"), Err(SimError::Json(_))));
    }

    #[test]
    fn detector_absorption() {
        let grid = Grid::from_json(SPLITTER_GRID).unwrap();
        let mut sim = Simulation::new(&grid, SimulationConfig::default()).unwrap();
        sim.initialize_from_laser().unwrap();
        assert_eq!(
            sim.last_frame().unwrap().photons.to_string(),
            "(1.00 +0.00i) |0,1,>,V⟩",
        );
        let frames = sim.generate_frames().unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].absorptions.is_empty());
        assert!((frames[1].probability - 1.0).abs() < 1e-12);
        let absorbed = &frames[2].absorptions;
        assert_eq!(absorbed.len(), 2);
        assert_eq!(absorbed[0].site, AbsorptionSite::Tile { x: 2, y: 1 });
        assert_eq!(absorbed[1].site, AbsorptionSite::Tile { x: 1, y: 2 });
        for a in absorbed.iter() {
            assert!((a.probability - 0.5).abs() < 1e-12);
        }
        assert!((frames[2].total_absorbed() - 1.0).abs() < 1e-12);
        assert!(frames[2].probability < 1e-12);
    }

    #[test]
    fn position_measurement() {
        let grid = Grid::from_json(SPLITTER_GRID).unwrap();
        let mut sim = Simulation::new(&grid, SimulationConfig::default()).unwrap();
        sim.initialize_from_laser().unwrap();
        sim.step().unwrap();
        let measurement = sim.measure().unwrap();
        assert_eq!(measurement.len(), 1);
        assert_eq!(
            measurement.to_string(),
            "100.0% [1,1] (0.71 +0.00i) |>,V⟩ + (0.00 +0.71i) |v,V⟩",
        );
    }

    #[test]
    fn two_photon_measurement() {
        let bs = elements::beam_splitter(135.0).unwrap();
        let placements = vec![Placement { x: 1, y: 1, operator: bs }];
        let mut sim
            = Simulation::from_placements(3, 3, placements, SimulationConfig::default())
            .unwrap();
        let mut photons = Photons::new(3, 3);
        photons.add_photon_from_indicator(0, 1, ">", "V").unwrap();
        photons.add_photon_from_indicator(1, 0, "v", "V").unwrap();
        sim.initialize_from_photons(photons).unwrap();
        sim.step().unwrap();
        let measurement = sim.measure().unwrap();
        assert_eq!(measurement.len(), 1);
        let branch = &measurement.states()[0];
        assert_eq!(branch.name_string(), "1,1 1,1");
        assert!((branch.probability() - 1.0).abs() < 1e-12);
        assert_eq!(branch.vector.names(), vec!["direction", "polarization", "direction", "polarization"]);
    }

    #[test]
    fn config_serde() {
        let config: SimulationConfig
            = serde_json::from_str(r#"{ "max_frames": 5 }"#).unwrap();
        assert_eq!(config, SimulationConfig::default().with_max_frames(5));
        let config
            = SimulationConfig::default()
            .with_stop_threshold(1e-3)
            .with_y_dir_means_down(false)
            .with_absorption_eps(0.0);
        let json = serde_json::to_string(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
