// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Undo hooks of the inspector. The undo system itself lives in the host, editors only mark the
//! boundaries of an edit.

use crate::core::reflect::Value;

/// Records edits made through the inspector. A record is opened when the first modification of
/// a refresh pass is accepted by a sync point and closed once that sync point's subtree was
/// refreshed.
pub trait UndoLog {
    fn is_enabled(&self) -> bool {
        true
    }

    /// Snapshots the targets before they are modified.
    fn begin_record(&mut self, targets: &[Value], label: &str);

    /// Snapshots the targets after modification and commits the record.
    fn end_record(&mut self, targets: &[Value]);
}
