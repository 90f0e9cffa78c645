use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use num_complex::Complex64;

mod color;
mod formula;
mod fractal;
mod io;
mod progress;
mod render;

use color::{palette_names, parse_maps, PipelineMode};
use fractal::{AttractorSpec, PlaneRegion, RenderConfig, ScalarGrid};
use io::{GifSink, OutputSink, PngSink};
use progress::LoadingBar;
use render::{
    generate, generate_parallel, render_frame_detailed, AnimationSpec, ParameterTrack,
    RenderError, Strategy,
};

/// Utilitaire CLI pour générer des ensembles de Julia.
///
/// Exemples d'utilisation :
///   fractanim --constant="-0.8+0.156i" --output-dir renders
///   fractanim --animation const-circle --frames 100 --output-dir renders
#[derive(Parser, Debug)]
#[command(
    name = "fractanim",
    about = "Générateur d'ensembles de Julia (formule d'attracteur libre) en PNG et GIF",
    version
)]
struct Cli {
    /// Formule de l'attracteur sur les variables z, const, a, b, c
    #[arg(long, default_value = "z^2 + const")]
    attractor: String,

    /// Constante complexe `const` (ex: -0.8+0.156i)
    #[arg(long, allow_hyphen_values = true)]
    constant: Option<Complex64>,

    /// Constante complexe additionnelle `a`
    #[arg(long, allow_hyphen_values = true)]
    a: Option<Complex64>,

    /// Constante complexe additionnelle `b`
    #[arg(long, allow_hyphen_values = true)]
    b: Option<Complex64>,

    /// Constante complexe additionnelle `c`
    #[arg(long, allow_hyphen_values = true)]
    c: Option<Complex64>,

    /// Largeur de l'image de sortie en pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Hauteur de l'image de sortie en pixels
    #[arg(long, default_value_t = 1000)]
    height: u32,

    /// Coordonnée minimale réelle du plan complexe
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    xmin: f64,

    /// Coordonnée maximale réelle du plan complexe
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    xmax: f64,

    /// Coordonnée minimale imaginaire du plan complexe
    #[arg(long, default_value_t = -2.0, allow_hyphen_values = true)]
    ymin: f64,

    /// Coordonnée maximale imaginaire du plan complexe
    #[arg(long, default_value_t = 2.0, allow_hyphen_values = true)]
    ymax: f64,

    /// Nombre maximal d'itérations
    #[arg(long, default_value_t = 256)]
    iterations: u32,

    /// Magnitude d'échappement
    #[arg(long, default_value_t = 2.0)]
    magnitude: f64,

    /// Étape de mapping couleur, répétable, appliquée de gauche à droite
    /// (root, plt <palette>, pltd <palette>, rev, cut <n>, mod <n>, add <n>)
    #[arg(long = "map")]
    maps: Vec<String>,

    /// Échoue sur une étape de mapping inconnue au lieu de l'ignorer
    #[arg(long)]
    strict_maps: bool,

    /// Utilise la stratégie vectorisée (par défaut pour les animations ;
    /// les images fixes utilisent la stratégie point par point)
    #[arg(long)]
    batched: bool,

    /// Affiche l'histogramme des orbites après le rendu
    #[arg(long)]
    histogram: bool,

    /// Répertoire de sortie
    #[arg(long, value_name = "REPERTOIRE", default_value = ".")]
    output_dir: PathBuf,

    /// Liste les palettes disponibles puis quitte
    #[arg(long)]
    palettes: bool,

    /// Mode d'animation (const-circle, const-line, zoom, region,
    /// color-cycle, waypoints, iter-ramp, slide) ; sans ce flag, rend une
    /// image fixe PNG
    #[arg(long)]
    animation: Option<String>,

    /// Nombre d'images de l'animation
    #[arg(long, default_value_t = 200)]
    frames: u32,

    /// Durée d'une image de l'animation en millisecondes
    #[arg(long, default_value_t = 50)]
    frame_duration: u32,

    /// Rend les images de l'animation en parallèle (une par worker,
    /// résultats collectés dans l'ordre, sans barre de progression)
    #[arg(long)]
    parallel: bool,

    /// Borne réelle minimale de la région d'arrivée du zoom
    #[arg(long, allow_hyphen_values = true)]
    end_xmin: Option<f64>,

    /// Borne réelle maximale de la région d'arrivée du zoom
    #[arg(long, allow_hyphen_values = true)]
    end_xmax: Option<f64>,

    /// Borne imaginaire minimale de la région d'arrivée du zoom
    #[arg(long, allow_hyphen_values = true)]
    end_ymin: Option<f64>,

    /// Borne imaginaire maximale de la région d'arrivée du zoom
    #[arg(long, allow_hyphen_values = true)]
    end_ymax: Option<f64>,

    /// Base logarithmique des pas de zoom
    #[arg(long, default_value_t = 10_000.0)]
    zoom_base: f64,

    /// Valeur d'arrivée de la constante (mode const-line)
    #[arg(long, allow_hyphen_values = true)]
    const_to: Option<Complex64>,

    /// Point de passage de la constante, répétable (modes waypoints et
    /// slide)
    #[arg(long = "waypoint", allow_hyphen_values = true)]
    waypoints: Vec<Complex64>,

    /// Plafond d'itérations de départ (mode iter-ramp)
    #[arg(long, default_value_t = 16)]
    iter_from: u32,

    /// Plafond d'itérations d'arrivée (mode iter-ramp)
    #[arg(long, default_value_t = 2048)]
    iter_to: u32,

    /// Espacement logarithmique des plafonds (mode iter-ramp)
    #[arg(long)]
    log_spread: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.palettes {
        println!("Palettes disponibles: {}", palette_names().join(", "));
        return;
    }

    let region = match PlaneRegion::new(cli.xmin, cli.xmax, cli.ymin, cli.ymax) {
        Ok(region) => region,
        Err(e) => {
            eprintln!("Erreur: {e}");
            process::exit(1);
        }
    };

    let mode = if cli.strict_maps {
        PipelineMode::Strict
    } else {
        PipelineMode::Permissive
    };
    let map_specs = if cli.maps.is_empty() {
        vec!["plt twilight".to_string()]
    } else {
        cli.maps.clone()
    };
    let maps = match parse_maps(&map_specs, mode) {
        Ok(maps) => maps,
        Err(e) => {
            eprintln!("Erreur: {e}");
            process::exit(1);
        }
    };

    let zero = Complex64::new(0.0, 0.0);
    let config = RenderConfig {
        width: cli.width,
        height: cli.height,
        max_iterations: cli.iterations,
        max_magnitude: cli.magnitude,
        region,
        attractor: AttractorSpec {
            expression: cli.attractor.clone(),
            constant: cli.constant.unwrap_or(zero),
            a: cli.a.unwrap_or(zero),
            b: cli.b.unwrap_or(zero),
            c: cli.c.unwrap_or(zero),
        },
        maps,
        color_shift: 0,
    };

    let result = match &cli.animation {
        Some(mode) => run_animation(&cli, config, mode),
        None => run_still(&cli, config),
    };

    if let Err(e) = result {
        eprintln!("Erreur: {e}");
        process::exit(1);
    }
}

fn run_still(cli: &Cli, config: RenderConfig) -> Result<(), RenderError> {
    let strategy = if cli.batched {
        Strategy::Batched
    } else {
        Strategy::Pointwise
    };

    let frame = if strategy == Strategy::Pointwise {
        let mut bar = LoadingBar::new();
        render_frame_detailed(&config, strategy, Some(&mut bar))?
    } else {
        println!("calcul des orbites (vectorisé)...");
        render_frame_detailed(&config, strategy, None)?
    };

    let sink = PngSink::new(&cli.output_dir);
    let path = sink.write_still(&frame.pixels, &config)?;
    println!("Image enregistrée: {}", path.display());

    if cli.histogram {
        print_histogram(&frame.orbits);
    }
    Ok(())
}

/// Région d'arrivée des modes zoom/region/slide, lue sur les flags
/// `--end-*`.
fn end_region(cli: &Cli, mode: &str) -> Result<PlaneRegion, RenderError> {
    let (Some(xmin), Some(xmax), Some(ymin), Some(ymax)) =
        (cli.end_xmin, cli.end_xmax, cli.end_ymin, cli.end_ymax)
    else {
        eprintln!("Le mode {mode} requiert --end-xmin, --end-xmax, --end-ymin et --end-ymax");
        process::exit(1);
    };
    Ok(PlaneRegion::new(xmin, xmax, ymin, ymax)?)
}

fn waypoints_or_exit(cli: &Cli, mode: &str) -> Vec<Complex64> {
    if cli.waypoints.len() < 2 {
        eprintln!("Le mode {mode} requiert au moins deux --waypoint");
        process::exit(1);
    }
    cli.waypoints.clone()
}

fn run_animation(cli: &Cli, config: RenderConfig, mode: &str) -> Result<(), RenderError> {
    let tracks = match mode {
        "const-circle" => vec![ParameterTrack::ConstCircle {
            base: config.attractor.constant,
        }],
        "const-line" => {
            let Some(to) = cli.const_to else {
                eprintln!("Le mode const-line requiert --const-to");
                process::exit(1);
            };
            vec![ParameterTrack::ConstLinear {
                from: config.attractor.constant,
                to,
            }]
        }
        "zoom" => vec![ParameterTrack::ZoomLog {
            to: end_region(cli, mode)?,
            base: cli.zoom_base,
        }],
        "region" => vec![ParameterTrack::RegionLinear {
            to: end_region(cli, mode)?,
        }],
        "color-cycle" => vec![ParameterTrack::ColorCycle],
        "waypoints" => vec![ParameterTrack::ConstWaypoints {
            points: waypoints_or_exit(cli, mode),
        }],
        "iter-ramp" => vec![ParameterTrack::IterationRamp {
            from: cli.iter_from,
            to: cli.iter_to,
            log_spread: cli.log_spread,
        }],
        // glissement latéral historique : parcours des points de passage,
        // translation de la région et cycle de couleurs à la fois
        "slide" => vec![
            ParameterTrack::RegionLinear {
                to: end_region(cli, mode)?,
            },
            ParameterTrack::ConstWaypoints {
                points: waypoints_or_exit(cli, mode),
            },
            ParameterTrack::ColorCycle,
        ],
        other => {
            eprintln!(
                "Mode d'animation invalide: '{other}'. Options: const-circle, const-line, zoom, region, color-cycle, waypoints, iter-ramp, slide"
            );
            process::exit(1);
        }
    };

    let spec = AnimationSpec {
        frames_amount: cli.frames,
        frame_duration_ms: cli.frame_duration,
        base: config.clone(),
        tracks,
    };

    let frames = if cli.parallel {
        println!("rendu de {} images (parallèle)...", cli.frames);
        generate_parallel(&spec)?
    } else {
        let mut bar = LoadingBar::new();
        generate(&spec, Some(&mut bar))?
    };

    let sink = GifSink::new(&cli.output_dir);
    let path = sink.write_animation(&frames, spec.frame_duration_ms, &config)?;
    println!("Animation enregistrée: {}", path.display());
    Ok(())
}

/// Histogramme des orbites sur stdout (diagnostic de la répartition des
/// itérations).
fn print_histogram(orbits: &ScalarGrid) {
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for &value in orbits.data() {
        *counts.entry(value).or_insert(0) += 1;
    }

    println!();
    println!("Orbites distinctes: {}", counts.len());
    println!("Histogramme des orbites:");
    for (orbit, count) in counts {
        println!("{orbit}: {count}");
    }
}
