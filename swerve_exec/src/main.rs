//! Main swerve executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - System input acquisition:
//!             - Module sensing
//!             - IMU sensing
//!             - Vision estimates
//!         - Localisation processing
//!         - Telecommand processing and handling
//!         - Drive control processing
//!         - Drivetrain demand application
//!         - Telemetry
//!         - Simulation step
//!
//! The executable drives simulated equipment from a telecommand script, given as the only
//! argument.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use std::{env, thread, time::Instant};

// Internal
use comms_if::eqpt::vision::VisionSource;
use swerve_lib::{
    data_store::DataStore,
    drive_ctrl::{self, DriveCtrl},
    drivetrain::Drivetrain,
    geom::Pose,
    kinematics::{self, ForwardKinematics, ModuleGeometry, SwerveKinematics},
    loc::{self, LocInput, PoseEstimator},
    params::SwerveExecParams,
    sim::{LineFollower, SimImu, SimModule, SimVision, SimWorld},
    tc_processor,
    telemetry::{record_cycle, ArchiveTelemetry},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
    time::seconds_to_std,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("swerve_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SwerveExecParams =
        util::params::load("swerve_exec.toml").wrap_err("Could not load exec params")?;
    let kin_params: kinematics::Params =
        util::params::load("kinematics.toml").wrap_err("Could not load kinematics params")?;
    let loc_params: loc::Params =
        util::params::load("loc.toml").wrap_err("Could not load localisation params")?;
    let drive_ctrl_params: drive_ctrl::Params =
        util::params::load("drive_ctrl.toml").wrap_err("Could not load drive control params")?;

    if (exec_params.cycle_period_s - kin_params.loop_period_s).abs() > 1e-9 {
        return Err(eyre!(
            "Cycle period ({} s) does not match the kinematics loop period ({} s)",
            exec_params.cycle_period_s,
            kin_params.loop_period_s
        ));
    }
    let cycle_frequency_hz = 1.0 / exec_params.cycle_period_s;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SCRIPT ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    let mut script_interpreter = if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        si
    }
    else {
        return Err(eyre!("Expected path to TC script as only argument"));
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();
    ds.alliance = exec_params.alliance;

    // ---- INITIALISE EQUIPMENT ----

    let geometry = ModuleGeometry::from_arrays(&kin_params.module_positions_m_rb)
        .wrap_err("Invalid module geometry")?;
    let initial_pose = Pose::from_array(exec_params.initial_pose);

    let world = SimWorld::new(geometry.clone(), initial_pose)
        .wrap_err("Failed to create the simulated world")?
        .into_shared();

    let mut drivetrain = Drivetrain::new(
        SimModule::all(&world),
        Box::new(SimImu::new(&world)),
        exec_params.imu_filter_taps,
    )
    .wrap_err("Failed to initialise the drivetrain")?;
    info!("Drivetrain init complete, {} modules", drivetrain.num_modules());

    let mut vision = SimVision::new(
        &world,
        exec_params.vision_period_s,
        exec_params.vision_std_dev,
        exec_params.vision_seed,
    );

    // ---- INITIALISE MODULES ----

    let measured_kinematics =
        ForwardKinematics::new(geometry.clone()).wrap_err("Failed to create forward kinematics")?;

    let mut estimator = {
        let data = drivetrain.sense();
        PoseEstimator::new(
            loc_params,
            ForwardKinematics::new(geometry).wrap_err("Failed to create forward kinematics")?,
            data.imu.yaw_rad,
            &data.module_positions,
            initial_pose,
        )
        .wrap_err("Failed to initialise the pose estimator")?
    };
    info!("PoseEstimator init complete");

    let mut drive_ctrl = DriveCtrl::new(
        drive_ctrl_params,
        SwerveKinematics::from_params(&kin_params).wrap_err("Failed to create the kinematics")?,
        Box::new(LineFollower::new(
            exec_params.cycle_period_s,
            exec_params.follower_position_tolerance_m,
            exec_params.follower_heading_tolerance_rad,
            exec_params.follower_heading_kp,
        )),
    )
    .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    let mut tm = ArchiveTelemetry::new(&session, &exec_params.telemetry_file)
        .wrap_err("Failed to open the telemetry archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz);
        ds.sim_time_s = world.borrow().time_s();

        // ---- DATA INPUT ----

        ds.drivetrain_data = drivetrain.sense();
        ds.true_pose = world.borrow().pose();

        // ---- LOCALISATION ----

        let loc_input = LocInput {
            timestamp_s: ds.sim_time_s,
            gyro_yaw_rad: ds.drivetrain_data.imu.yaw_rad,
            yaw_rate_rads: ds.drivetrain_data.imu.yaw_rate_rads,
            module_positions: ds.drivetrain_data.module_positions.clone(),
            vision: vision.estimated_poses(),
        };

        match estimator.proc(&loc_input) {
            Ok((_, r)) => ds.loc_status_rpt = r,
            Err(e) => warn!("Error during localisation processing: {}", e),
        }

        ds.odometry_pose = estimator.odometry_pose();
        ds.heading_rate_rads = estimator.heading_rate_rads();

        // ---- TELECOMMAND PROCESSING ----

        match script_interpreter.get_pending_tcs(ds.sim_time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- DRIVE CONTROL INPUT ----

        // Must follow TC execution
        let measured_motion = measured_kinematics
            .to_chassis_motion(&ds.drivetrain_data.module_states)
            .unwrap_or_default();
        ds.update_drive_ctrl_input(
            estimator.estimate(),
            estimator.travel_direction_rad(),
            measured_motion,
        );

        tc_processor::carry_out_requests(&mut ds, &mut drive_ctrl, &mut estimator);

        // ---- CONTROL ALGORITHM PROCESSING ----

        match drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((o, r)) => {
                ds.drive_ctrl_output = o;
                ds.drive_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during DriveCtrl processing: {}", e),
        }

        for t in ds.drive_ctrl_status_rpt.transitions.iter() {
            info!("Drive mode {:?} -> {:?}", t.from, t.to);
        }

        // Apply demands to the drivetrain
        if let Err(e) = drivetrain.apply(&ds.cycle_dems()) {
            warn!("Drive demands rejected: {}", e);
        }

        // ---- TELEMETRY ----

        tm.set_time_s(ds.sim_time_s);
        record_cycle(&mut tm, &ds);

        if ds.is_1_hz_cycle {
            debug!(
                "Estimate {:?}, truth {:?}",
                ds.drive_ctrl_input.pose.to_array(),
                ds.true_pose.to_array()
            );
        }

        // ---- SIMULATION ----

        world
            .borrow_mut()
            .step(exec_params.cycle_period_s)
            .wrap_err("Failed to step the simulation")?;

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match seconds_to_std(exec_params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
