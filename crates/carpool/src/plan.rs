//! Greedy nearest-time carpool planning.
//!
//! Planning is pure: it looks at the attendance of one event and decides
//! which driver records should exist and which car everyone rides in. The
//! engine applies the plan to the store.

use std::collections::HashMap;

use hangout_core::{Attendance, AttendanceId, Driver, DriverId, Time};

use crate::CarpoolConfig;

/// The outcome of planning one event.
#[derive(Debug, Clone, Default)]
pub struct AssignmentPlan {
    /// Driver records to store, in creation order
    pub drivers: Vec<Driver>,
    /// Final driver reference for every record the plan touches
    pub assignments: Vec<(AttendanceId, Option<DriverId>)>,
    /// Eligible passengers left without a car
    pub unassigned: Vec<AttendanceId>,
}

impl AssignmentPlan {
    /// Driver assigned to an attendance record, if the plan touches it.
    pub fn driver_of(&self, id: AttendanceId) -> Option<DriverId> {
        self.assignments
            .iter()
            .find(|(a, _)| *a == id)
            .and_then(|(_, d)| *d)
    }

    /// Number of records riding in each car, drivers included.
    pub fn occupancy(&self) -> HashMap<DriverId, u32> {
        let mut counts = HashMap::new();
        for driver in self.assignments.iter().filter_map(|(_, d)| *d) {
            *counts.entry(driver).or_insert(0) += 1;
        }
        counts
    }
}

/// A car being filled during planning.
struct Car {
    driver: Driver,
    occupied: u32,
}

impl Car {
    fn has_room(&self) -> bool {
        self.occupied < self.driver.capacity
    }
}

/// Build a fresh assignment for one event's attendance.
///
/// Only confirmed records with a time take part. They are ordered by time
/// (ties by attendance id) and split into drivers and passengers. Each driver
/// gets a new driver record and rides in it. Passengers then pick, in time
/// order, the car with room whose departure is closest in whole minutes;
/// equal distances go to the car created first. Records outside the eligible
/// set lose any reference they held, since all previous drivers are replaced.
pub fn plan_assignment(attendance: &[Attendance], config: &CarpoolConfig) -> AssignmentPlan {
    let mut plan = AssignmentPlan::default();

    for stale in attendance.iter().filter(|a| !a.is_eligible() && a.driver_id.is_some()) {
        plan.assignments.push((stale.id, None));
    }

    let mut eligible: Vec<&Attendance> = attendance.iter().filter(|a| a.is_eligible()).collect();
    eligible.sort_by(|a, b| a.arrival.cmp(&b.arrival).then(a.id.cmp(&b.id)));

    let (driving, riding): (Vec<&Attendance>, Vec<&Attendance>) =
        eligible.into_iter().partition(|a| a.will_drive);

    let mut cars: Vec<Car> = Vec::with_capacity(driving.len());
    for rsvp in driving {
        let Some(driver) = Driver::from_attendance(rsvp, config.default_seats, config.vehicle_note.as_str()) else {
            continue;
        };
        plan.assignments.push((rsvp.id, Some(driver.id)));
        cars.push(Car { driver, occupied: 1 });
    }

    for passenger in riding {
        let Some(arrival) = passenger.arrival else {
            continue;
        };
        match best_car(&cars, arrival) {
            Some(index) => {
                let car = &mut cars[index];
                car.occupied += 1;
                plan.assignments.push((passenger.id, Some(car.driver.id)));
            }
            None => {
                plan.assignments.push((passenger.id, None));
                plan.unassigned.push(passenger.id);
            }
        }
    }

    plan.drivers = cars.into_iter().map(|c| c.driver).collect();
    plan
}

/// Index of the car with room closest to `arrival`; first one wins ties.
fn best_car(cars: &[Car], arrival: Time) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, car) in cars.iter().enumerate() {
        if !car.has_room() {
            continue;
        }
        let diff = minutes_between(arrival, car.driver.departure);
        if best.map_or(true, |(_, smallest)| diff < smallest) {
            best = Some((index, diff));
        }
    }
    best.map(|(index, _)| index)
}

/// Absolute difference in whole minutes, truncated toward zero.
pub fn minutes_between(a: Time, b: Time) -> i64 {
    (a - b).num_minutes().abs()
}
