// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error};
use image::ColorType;
use mandelbrot::{ChannelScale, ColorParams, Monochrome, Palette, Polynomial, Rendering, Viewport};
use num::Complex;
use std::path::Path;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn parse_caps(s: &str) -> Option<ColorParams> {
    let caps: Vec<u32> = s
        .split(',')
        .map(u32::from_str)
        .collect::<Result<_, _>>()
        .ok()?;
    match caps.as_slice() {
        [red, green, blue] => Some(ColorParams {
            red: *red,
            green: *green,
            blue: *blue,
        }),
        _ => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const PALETTE: &str = "palette";
const CAPS: &str = "caps";
const ZOOM: &str = "zoom";
const VERBOSE: &str = "verbose";

const PALETTES: &[&str] = &["polynomial", "channels", "mono"];

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandel")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Parallel escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x400")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,-1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.3,1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse thread count",
                        "Thread count must be at least 1",
                    )
                })
                .help("Number of threads to use in solver [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("400")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .required(false)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .possible_values(PALETTES)
                .default_value("polynomial")
                .help("Color scheme"),
        )
        .arg(
            Arg::with_name(CAPS)
                .required(false)
                .long(CAPS)
                .short("c")
                .takes_value(true)
                .default_value("100,100,100")
                .validator(|s| match parse_caps(&s) {
                    Some(_) => Ok(()),
                    None => Err("Could not parse channel caps".to_string()),
                })
                .help("Red, green and blue caps for the 'channels' palette"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0")
                .validator(|s| {
                    validate_range(
                        &s,
                        -1000,
                        1000,
                        "Could not parse zoom steps",
                        "Zoom steps must be between -1000 and 1000",
                    )
                })
                .help("Shrink every bound by this many 0.1 steps; negative values grow them"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .help("Log the render plan"),
        )
        .get_matches()
}

fn write_image(outfile: &str, rendering: &Rendering) -> Result<(), Error> {
    let pixels = &rendering.pixels;
    image::save_buffer(
        Path::new(outfile),
        pixels.as_bytes(),
        pixels.width() as u32,
        pixels.height() as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let image_size = parse_pair::<u16>(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let leftlower = parse_complex(matches.value_of(LEFTLOWER).unwrap_or_default())
        .ok_or_else(|| format_err!("Error parsing left lower point"))?;
    let rightupper = parse_complex(matches.value_of(RIGHTUPPER).unwrap_or_default())
        .ok_or_else(|| format_err!("Error parsing right upper point"))?;
    let iterations = u32::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?;
    let zoom = i32::from_str(matches.value_of(ZOOM).unwrap_or_default())?;
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t)?,
        None => num_cpus::get(),
    };
    let params = parse_caps(matches.value_of(CAPS).unwrap_or_default())
        .ok_or_else(|| format_err!("Error parsing channel caps"))?;

    let viewport = Viewport::new(
        usize::from(image_size.0),
        usize::from(image_size.1),
        leftlower,
        rightupper,
        iterations,
    )?
    .zoom(zoom)?;

    let palette: &dyn Palette = match matches.value_of(PALETTE) {
        Some("channels") => &ChannelScale,
        Some("mono") => &Monochrome,
        _ => &Polynomial,
    };

    let rendering = mandelbrot::render(&viewport, None, palette, &params, threads)?;
    info!(
        "Rendered {}x{} on {} threads",
        viewport.width, viewport.height, rendering.parallelism
    );

    let outfile = matches.value_of(OUTPUT).unwrap_or_default();
    write_image(outfile, &rendering)?;
    info!("Wrote {}", outfile);
    Ok(())
}

fn main() {
    let matches = args();
    let level = if matches.is_present(VERBOSE) { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&matches) {
        debug!("{:?}", e);
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
