// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry engine backed by the OpenSCAD executable

use super::writer::{quote, Dimension, ScadProgram};
use crate::ast::{Geometry2D, Geometry3D, Geometry3DKind, LinearExtrude};
use crate::config::EngineConfig;
use crate::engine::{read_stl_points, Bounds2, Bounds3, GeometryEngine, MeshFormat};
use crate::error::EngineError;
use crate::vector::Vector2D;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Engine that lowers trees to OpenSCAD programs and runs `openscad`
#[derive(Debug, Clone, Default)]
pub struct OpenScadEngine {
    config: EngineConfig,
}

impl OpenScadEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configured from `polyframe-csg.toml` and the environment
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(EngineConfig::load()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check if the OpenSCAD executable can be started
    pub fn is_available(&self) -> bool {
        Command::new(self.config.openscad())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Program for a 2D root, with disk-cached units already substituted
    pub fn program_2d(&self, geometry: &Geometry2D) -> Result<ScadProgram, EngineError> {
        let mut program = ScadProgram::from_2d(geometry);
        self.materialize_units(&mut program)?;
        Ok(program)
    }

    /// Program for a 3D root, with disk-cached units already substituted
    pub fn program_3d(&self, geometry: &Geometry3D) -> Result<ScadProgram, EngineError> {
        let mut program = ScadProgram::from_3d(geometry);
        self.materialize_units(&mut program)?;
        Ok(program)
    }

    /// Render every 3D unit missing from the disk cache and point the
    /// program's module bodies at the rendered meshes
    fn materialize_units(&self, program: &mut ScadProgram) -> Result<(), EngineError> {
        if !self.config.use_disk_cache {
            return Ok(());
        }
        let cache_dir = &self.config.cache_dir;
        std::fs::create_dir_all(cache_dir).map_err(|e| EngineError::io(cache_dir, e))?;

        let solids: Vec<(usize, String)> = program
            .units()
            .iter()
            .enumerate()
            .filter(|(_, unit)| unit.dimension == Dimension::Three)
            .map(|(i, unit)| (i, unit.digest.clone()))
            .collect();

        for (index, digest) in solids {
            let mesh = cache_dir.join(format!("{digest}.stl"));
            if mesh.is_file() {
                debug!(unit = %digest, "disk cache hit");
            } else if let Some(source) = program.unit_program(index) {
                debug!(unit = %digest, path = ?mesh, "rendering cached unit");
                let partial = cache_dir.join(format!("{digest}.stl.partial"));
                self.render(&source, &partial, MeshFormat::Stl)?;
                std::fs::rename(&partial, &mesh).map_err(|e| EngineError::io(&mesh, e))?;
            }
            program.replace_body(index, format!("import({});\n", quote(&mesh)));
        }
        Ok(())
    }

    /// Run OpenSCAD on `source`, writing a mesh to `output`
    fn render(&self, source: &str, output: &Path, format: MeshFormat) -> Result<(), EngineError> {
        let workdir = tempfile::tempdir().map_err(|e| EngineError::io(std::env::temp_dir(), e))?;
        let input = workdir.path().join("model.scad");
        std::fs::write(&input, source).map_err(|e| EngineError::io(&input, e))?;

        let export_format = match format {
            MeshFormat::Stl => "binstl",
            MeshFormat::ThreeMf => "3mf",
        };
        let program = self.config.openscad();
        debug!(?program, ?input, ?output, "running OpenSCAD");

        let start = Instant::now();
        let child = Command::new(program)
            .arg("-o")
            .arg(output)
            .arg("--export-format")
            .arg(export_format)
            .arg(&input)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::io(program, e))?;

        let (status, stderr) = self.wait(child, program)?;
        debug!(elapsed = ?start.elapsed(), %status, "OpenSCAD finished");

        if !status.success() {
            if stderr.contains("top level object is empty") {
                return Err(EngineError::EmptyGeometry);
            }
            return Err(EngineError::Process {
                program: program.display().to_string(),
                status: status.to_string(),
                stderr,
            });
        }
        if stderr.contains("WARNING") {
            warn!(%stderr, "OpenSCAD reported warnings");
        }
        Ok(())
    }

    /// Wait for `child`, draining its stderr on a reader thread so a chatty
    /// run cannot block on a full pipe
    fn wait(
        &self,
        mut child: Child,
        program: &Path,
    ) -> Result<(std::process::ExitStatus, String), EngineError> {
        let reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let status = loop {
            match child.try_wait().map_err(|e| EngineError::io(program, e))? {
                Some(status) => break status,
                None => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        let _ = child.kill();
                        let _ = child.wait();
                        if let Some(reader) = reader {
                            let _ = reader.join();
                        }
                        return Err(EngineError::Process {
                            program: program.display().to_string(),
                            status: "timeout".to_string(),
                            stderr: format!(
                                "killed after {:?}",
                                self.config.timeout.unwrap_or_default()
                            ),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stderr = match reader {
            Some(reader) => match reader.join() {
                Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                Ok(Err(e)) => return Err(EngineError::io(program, e)),
                Err(_) => {
                    return Err(EngineError::Other(anyhow::anyhow!(
                        "stderr reader for {} panicked",
                        program.display()
                    )))
                }
            },
            None => String::new(),
        };
        Ok((status, stderr))
    }

    fn solid_bounds(&self, geometry: &Geometry3D) -> Result<Bounds3, EngineError> {
        let program = self.program_3d(geometry)?;
        let workdir = tempfile::tempdir().map_err(|e| EngineError::io(std::env::temp_dir(), e))?;
        let mesh = workdir.path().join("extent.stl");
        self.render(&program.source(), &mesh, MeshFormat::Stl)?;

        let points = read_stl_points(&mesh)?;
        let bounds = Bounds3::from_points(&points);
        if bounds.is_empty() {
            return Err(EngineError::EmptyGeometry);
        }
        Ok(bounds)
    }

    fn write_view(&self, source: String, window: u32) -> Result<PathBuf, EngineError> {
        let dir = &self.config.view_dir;
        std::fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
        let path = dir.join(format!("View{window}.scad"));
        std::fs::write(&path, source).map_err(|e| EngineError::io(&path, e))?;
        debug!(?path, "wrote view");
        Ok(path)
    }
}

impl GeometryEngine for OpenScadEngine {
    fn bounds_2d(&self, geometry: &Geometry2D) -> Result<Bounds2, EngineError> {
        let slab = Geometry3D::from_kind(Geometry3DKind::LinearExtrude {
            params: LinearExtrude::new(1.0),
            child: geometry.clone(),
        });
        let b = self.solid_bounds(&slab)?;
        Ok(Bounds2::new(
            Vector2D::new(b.min.x, b.min.y),
            Vector2D::new(b.max.x, b.max.y),
        ))
    }

    fn bounds_3d(&self, geometry: &Geometry3D) -> Result<Bounds3, EngineError> {
        self.solid_bounds(geometry)
    }

    fn view_2d(&self, geometry: &Geometry2D, window: u32) -> Result<(), EngineError> {
        let program = self.program_2d(geometry)?;
        self.write_view(program.source(), window).map(|_| ())
    }

    fn view_3d(&self, geometry: &Geometry3D, window: u32) -> Result<(), EngineError> {
        let program = self.program_3d(geometry)?;
        self.write_view(program.source(), window).map(|_| ())
    }

    fn export(
        &self,
        geometry: &Geometry3D,
        path: &Path,
        format: MeshFormat,
    ) -> Result<(), EngineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
        }
        let program = self.program_3d(geometry)?;
        self.render(&program.source(), path, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::vector2d;
    use tempfile::TempDir;

    fn triangle() -> Geometry2D {
        Geometry2D::polygon([vector2d(0.0, 0.0), vector2d(1.0, 0.0), vector2d(0.0, 1.0)]).unwrap()
    }

    fn engine_in(dir: &TempDir) -> OpenScadEngine {
        OpenScadEngine::new(EngineConfig::default().with_view_dir(dir.path().join("views")))
    }

    #[test]
    fn test_view_writes_numbered_file() {
        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        engine.view_2d(&triangle(), 3).unwrap();

        let written = std::fs::read_to_string(dir.path().join("views/View3.scad")).unwrap();
        assert!(written.contains("polygon(points=[[0, 0], [1, 0], [0, 1]]);"));
    }

    #[test]
    fn test_missing_executable_is_engine_error() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            openscad_path: Some(dir.path().join("no-such-openscad")),
            ..EngineConfig::default()
        };
        let engine = OpenScadEngine::new(config);

        assert!(!engine.is_available());
        let err = engine
            .bounds_3d(&triangle().extrude(1.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    /// Stand-in executable running `body` as a shell script
    #[cfg(unix)]
    fn fake_openscad(dir: &TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-openscad");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stderr_does_not_block_run() {
        let dir = TempDir::new().unwrap();
        let script = fake_openscad(
            &dir,
            "head -c 262144 /dev/zero | tr '\\0' 'x' >&2\nexit 0",
        );
        let config = EngineConfig {
            openscad_path: Some(script),
            timeout: Some(Duration::from_secs(20)),
            ..EngineConfig::default()
        };
        let engine = OpenScadEngine::new(config);
        let solid = triangle().extrude(1.0).unwrap();

        let out = dir.path().join("out/part.stl");
        engine.export(&solid, &out, MeshFormat::Stl).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_run_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let script = fake_openscad(&dir, "echo 'ERROR: Parser error' >&2\nexit 1");
        let engine = OpenScadEngine::new(EngineConfig {
            openscad_path: Some(script),
            ..EngineConfig::default()
        });

        let err = engine
            .export(&triangle().extrude(1.0).unwrap(), &dir.path().join("x.stl"), MeshFormat::Stl)
            .unwrap_err();
        match err {
            EngineError::Process { stderr, .. } => assert!(stderr.contains("Parser error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disk_cache_substitutes_existing_mesh() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("units");
        let engine = OpenScadEngine::new(EngineConfig::default().with_disk_cache(&cache));

        let unit = triangle().extrude(1.0).unwrap().cache();
        let root = Geometry3D::union([&unit, &unit]).unwrap();
        let digest = ScadProgram::from_3d(&root).units()[0].digest.clone();

        std::fs::create_dir_all(&cache).unwrap();
        let mesh = cache.join(format!("{digest}.stl"));
        std::fs::write(&mesh, b"").unwrap();

        let program = engine.program_3d(&root).unwrap();
        assert_eq!(
            program.units()[0].body(),
            format!("import({});\n", quote(&mesh))
        );
        assert!(!program.source().contains("polygon("));
    }
}
